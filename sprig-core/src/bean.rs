use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::bean_factory::BeanFactory;
use crate::{BeanRole, ContainerResult, Scope};

/// 容器中保存的 Bean 实例类型
pub type SharedBean = Arc<dyn Any + Send + Sync>;

/// 对象工厂 trait - 用于创建 Bean 实例
///
/// `beans` 是正在创建该 Bean 的容器，工厂通过它查找依赖，
/// 从而拿到与其他调用方相同的单例实例
pub trait ObjectFactory: Send + Sync {
    /// 创建 Bean 实例
    fn create(&self, beans: &dyn BeanFactory) -> ContainerResult<SharedBean>;

    /// 获取 Bean 的类型 ID
    fn bean_type_id(&self) -> TypeId;

    /// 获取 Bean 的类型名称
    fn bean_type_name(&self) -> &'static str;
}

/// 生命周期回调类型
pub type InitCallback = Box<dyn Fn(&mut (dyn Any + Send + Sync)) -> ContainerResult<()> + Send + Sync>;
pub type DestroyCallback =
    Box<dyn Fn(&mut (dyn Any + Send + Sync)) -> ContainerResult<()> + Send + Sync>;

/// Bean 定义 - 描述如何创建和管理 Bean
pub struct BeanDefinition {
    /// Bean 的名称
    pub name: String,

    /// Bean 的作用域
    pub scope: Scope,

    /// Bean 的角色（应用 / 框架内部）
    pub role: BeanRole,

    /// 对象工厂
    pub factory: Arc<dyn ObjectFactory>,

    /// 是否延迟初始化（仅对单例有效）
    pub lazy: bool,

    /// 显式声明的依赖（创建前先解析这些 Bean）
    pub dependencies: Vec<String>,

    /// 初始化回调
    pub init_callback: Option<InitCallback>,

    /// 销毁回调
    pub destroy_callback: Option<DestroyCallback>,
}

impl BeanDefinition {
    /// 创建新的 Bean 定义
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: ObjectFactory + 'static,
    {
        Self {
            name: name.into(),
            scope: Scope::default(),
            role: BeanRole::default(),
            factory: Arc::new(factory),
            lazy: false,
            dependencies: Vec::new(),
            init_callback: None,
            destroy_callback: None,
        }
    }

    /// 使用已经存在的共享实例创建单例 Bean 定义
    pub fn from_instance<T>(name: impl Into<String>, instance: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::new(name, InstanceFactory::new(instance)).with_scope(Scope::Singleton)
    }

    /// 设置作用域
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// 设置角色
    pub fn with_role(mut self, role: BeanRole) -> Self {
        self.role = role;
        self
    }

    /// 设置延迟初始化
    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// 设置依赖列表
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// 设置初始化回调
    pub fn with_init<F>(mut self, init_fn: F) -> Self
    where
        F: Fn(&mut (dyn Any + Send + Sync)) -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.init_callback = Some(Box::new(init_fn));
        self
    }

    /// 设置销毁回调
    pub fn with_destroy<F>(mut self, destroy_fn: F) -> Self
    where
        F: Fn(&mut (dyn Any + Send + Sync)) -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.destroy_callback = Some(Box::new(destroy_fn));
        self
    }

    pub fn is_singleton(&self) -> bool {
        self.scope == Scope::Singleton
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("role", &self.role)
            .field("lazy", &self.lazy)
            .field("dependencies", &self.dependencies)
            .field("type_name", &self.factory.bean_type_name())
            .finish()
    }
}

/// 基于闭包的工厂实现
pub struct FunctionFactory<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&dyn BeanFactory) -> ContainerResult<T> + Send + Sync,
{
    factory_fn: F,
    _phantom: PhantomData<fn() -> T>,
}

impl<T, F> FunctionFactory<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&dyn BeanFactory) -> ContainerResult<T> + Send + Sync,
{
    pub fn new(factory_fn: F) -> Self {
        Self {
            factory_fn,
            _phantom: PhantomData,
        }
    }
}

impl<T, F> ObjectFactory for FunctionFactory<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&dyn BeanFactory) -> ContainerResult<T> + Send + Sync,
{
    fn create(&self, beans: &dyn BeanFactory) -> ContainerResult<SharedBean> {
        let instance: SharedBean = Arc::new((self.factory_fn)(beans)?);
        Ok(instance)
    }

    fn bean_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn bean_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// 持有预先构造好的实例的工厂，每次返回同一个实例
pub struct InstanceFactory<T: Any + Send + Sync> {
    instance: Arc<T>,
}

impl<T: Any + Send + Sync> InstanceFactory<T> {
    pub fn new(instance: Arc<T>) -> Self {
        Self { instance }
    }
}

impl<T: Any + Send + Sync> ObjectFactory for InstanceFactory<T> {
    fn create(&self, _beans: &dyn BeanFactory) -> ContainerResult<SharedBean> {
        let instance: SharedBean = self.instance.clone();
        Ok(instance)
    }

    fn bean_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn bean_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}
