//! Bean Factory - 核心容器接口
//!
//! 参考 Spring 的 BeanFactory 架构设计，拆分为几个职责单一的 trait：
//! 查找（[`BeanFactory`]）、列举（[`ListableBeanFactory`]）、
//! 注册（[`BeanDefinitionRegistry`]）以及生命周期管理
//! （[`ConfigurableListableBeanFactory`]）

use std::any::{Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};

use crate::{
    bean::{BeanDefinition, SharedBean},
    error::{ContainerError, ContainerResult},
    utils::dependency::CreationTracker,
    BeanRole, Scope,
};

/// BeanFactory - 最基础的容器接口
///
/// 不包含泛型方法，可以作为 trait object 使用。
/// 工厂方法通过 `&dyn BeanFactory` 查找依赖
pub trait BeanFactory: Send + Sync {
    /// 通过名称获取 Bean
    fn get_bean(&self, name: &str) -> ContainerResult<SharedBean>;

    /// 通过类型获取 Bean（要求该类型只有一个候选）
    fn get_bean_by_type_id(&self, type_id: TypeId, type_name: &str)
        -> ContainerResult<SharedBean>;

    /// 检查是否包含指定名称的 Bean
    fn contains_bean(&self, name: &str) -> bool;

    /// 检查是否包含指定类型的 Bean
    fn contains_bean_of_type_id(&self, type_id: TypeId) -> bool;

    /// 获取 Bean 定义声明的类型名称
    fn get_bean_type_name(&self, name: &str) -> Option<&'static str>;
}

/// BeanFactoryExt - BeanFactory 的泛型扩展
///
/// 对所有 BeanFactory（包括 `dyn BeanFactory`）自动实现
pub trait BeanFactoryExt: BeanFactory {
    /// 通过类型获取 Bean
    fn get_bean_by_type<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>> {
        let type_name = std::any::type_name::<T>();
        let bean = self.get_bean_by_type_id(TypeId::of::<T>(), type_name)?;
        downcast_bean(bean, type_name, "unknown")
    }

    /// 通过名称获取 Bean 并转换为具体类型
    fn get_typed_bean<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        let bean = self.get_bean(name)?;
        let found = self.get_bean_type_name(name).unwrap_or("unknown");
        downcast_bean(bean, std::any::type_name::<T>(), found)
    }

    /// 检查是否包含指定类型的 Bean
    fn contains_bean_by_type<T: Any + Send + Sync>(&self) -> bool {
        self.contains_bean_of_type_id(TypeId::of::<T>())
    }
}

impl<B: BeanFactory + ?Sized> BeanFactoryExt for B {}

fn downcast_bean<T: Any + Send + Sync>(
    bean: SharedBean,
    expected: &str,
    found: &str,
) -> ContainerResult<Arc<T>> {
    bean.downcast::<T>().map_err(|_| ContainerError::TypeMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
    })
}

/// ListableBeanFactory - 可列举的 Bean 工厂
pub trait ListableBeanFactory: BeanFactory {
    /// 获取所有 Bean 的名称（按注册顺序）
    fn get_bean_names(&self) -> Vec<String>;

    /// 获取指定类型的所有 Bean 名称
    fn get_bean_names_for_type(&self, type_id: TypeId) -> Vec<String>;

    /// 获取指定角色的所有 Bean 名称（按注册顺序）
    fn get_bean_names_for_role(&self, role: BeanRole) -> Vec<String>;

    /// 获取 Bean 定义的数量
    fn get_bean_definition_count(&self) -> usize;
}

/// BeanDefinitionRegistry - Bean 定义注册表
///
/// 可以作为 trait object 使用，`#[configuration]` 生成的代码通过它注册 Bean 方法
pub trait BeanDefinitionRegistry: Send + Sync {
    /// 注册 Bean 定义
    fn register_bean_definition(&self, definition: BeanDefinition) -> ContainerResult<()>;

    /// 检查是否包含指定的 Bean 定义
    fn contains_bean_definition(&self, name: &str) -> bool;

    /// 移除 Bean 定义
    fn remove_bean_definition(&self, name: &str) -> ContainerResult<()>;

    /// 获取单个 Bean 定义
    fn get_bean_definition(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>>;
}

/// ConfigurableListableBeanFactory - 可配置且可列举的 Bean 工厂
pub trait ConfigurableListableBeanFactory: ListableBeanFactory + BeanDefinitionRegistry {
    /// 预实例化所有非延迟加载的单例 Bean（按注册顺序）
    fn preinstantiate_singletons(&self) -> ContainerResult<()>;

    /// 冻结配置（不再允许修改 Bean 定义）
    fn freeze_configuration(&self);

    /// 检查配置是否已冻结
    fn is_configuration_frozen(&self) -> bool;

    /// 销毁所有单例 Bean（调用 destroy 回调）
    fn destroy_singletons(&self) -> ContainerResult<()>;

    /// 获取依赖图（Bean 名称 -> 显式声明的依赖）
    fn get_dependency_graph(&self) -> HashMap<String, Vec<String>>;
}

/// DefaultListableBeanFactory - ConfigurableListableBeanFactory 的默认实现
///
/// 除了可重入的单例创建锁，其他锁都不会在工厂方法执行期间持有，
/// 因此工厂方法可以安全地递归查找其他 Bean
pub struct DefaultListableBeanFactory {
    /// Bean 定义存储
    definitions: RwLock<HashMap<String, Arc<BeanDefinition>>>,

    /// Bean 名称（按注册顺序）
    definition_names: RwLock<Vec<String>>,

    /// 单例 Bean 缓存
    singletons: RwLock<HashMap<String, SharedBean>>,

    /// 单例创建顺序（销毁时逆序）
    singleton_order: Mutex<Vec<String>>,

    /// 类型到名称的映射
    type_to_names: RwLock<HashMap<TypeId, Vec<String>>>,

    /// 单例创建锁，保证每个单例的工厂方法只执行一次
    singleton_creation: ReentrantMutex<()>,

    /// 循环依赖检测（按线程记录创建链）
    creation_tracker: CreationTracker,

    /// 配置是否已冻结
    configuration_frozen: RwLock<bool>,
}

impl DefaultListableBeanFactory {
    /// 创建新的 Bean 工厂
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(HashMap::new()),
            definition_names: RwLock::new(Vec::new()),
            singletons: RwLock::new(HashMap::new()),
            singleton_order: Mutex::new(Vec::new()),
            type_to_names: RwLock::new(HashMap::new()),
            singleton_creation: ReentrantMutex::new(()),
            creation_tracker: CreationTracker::new(),
            configuration_frozen: RwLock::new(false),
        }
    }

    fn definition(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>> {
        self.definitions.read().get(name).cloned().ok_or_else(|| {
            tracing::debug!("Bean '{}' not found in container", name);
            ContainerError::BeanNotFound(name.to_string())
        })
    }

    fn ensure_not_frozen(&self, action: &str) -> ContainerResult<()> {
        if *self.configuration_frozen.read() {
            return Err(ContainerError::Other(anyhow::anyhow!(
                "Cannot {} bean definition: configuration is frozen",
                action
            )));
        }
        Ok(())
    }

    /// 创建 Bean 实例并调用生命周期回调
    ///
    /// 顺序：
    /// 1. 解析显式声明的依赖
    /// 2. 调用工厂创建实例（工厂可以通过 `self` 查找其他 Bean）
    /// 3. 调用 init 回调
    fn create_bean(&self, definition: &BeanDefinition) -> ContainerResult<SharedBean> {
        let name = definition.name.as_str();

        if !self.creation_tracker.start_creating(name) {
            let creating_chain = self.creation_tracker.current_creating();

            tracing::error!(
                "Circular dependency detected while creating '{}'. Creation chain: {:?}",
                name,
                creating_chain
            );

            return Err(ContainerError::CircularDependency(format!(
                "{} -> {}",
                creating_chain.join(" -> "),
                name
            )));
        }

        // 使用 RAII 模式确保在任何情况下都会清理标记
        struct CreationGuard<'a> {
            tracker: &'a CreationTracker,
            name: &'a str,
        }

        impl Drop for CreationGuard<'_> {
            fn drop(&mut self) {
                self.tracker.finish_creating(self.name);
            }
        }

        let _guard = CreationGuard {
            tracker: &self.creation_tracker,
            name,
        };

        for dependency in &definition.dependencies {
            tracing::trace!("Resolving dependency '{}' of bean '{}'", dependency, name);
            self.get_bean(dependency).map_err(|e| match e {
                ContainerError::CircularDependency(_) => e,
                _ => ContainerError::BeanCreationFailed(format!(
                    "{}: unresolved dependency '{}': {}",
                    name, dependency, e
                )),
            })?;
        }

        let mut bean = definition.factory.create(self).map_err(|e| {
            // 保留循环依赖错误，不要包装它
            match e {
                ContainerError::CircularDependency(_) => e,
                _ => ContainerError::BeanCreationFailed(format!("{}: {}", name, e)),
            }
        })?;

        if let Some(ref init_fn) = definition.init_callback {
            match Arc::get_mut(&mut bean) {
                Some(bean_mut) => init_fn(bean_mut).map_err(|e| {
                    ContainerError::BeanCreationFailed(format!("{} init failed: {}", name, e))
                })?,
                None => {
                    tracing::warn!("Cannot call init on bean '{}': multiple references exist", name)
                }
            }
        }

        Ok(bean)
    }
}

impl Default for DefaultListableBeanFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanFactory for DefaultListableBeanFactory {
    fn get_bean(&self, name: &str) -> ContainerResult<SharedBean> {
        tracing::trace!("Requesting bean: '{}'", name);

        let definition = self.definition(name)?;

        match definition.scope {
            Scope::Singleton => {
                if let Some(bean) = self.singletons.read().get(name) {
                    tracing::debug!("Returning cached instance of singleton bean '{}'", name);
                    return Ok(Arc::clone(bean));
                }

                let _creation = self.singleton_creation.lock();

                // 等锁期间可能已由其他线程创建
                if let Some(bean) = self.singletons.read().get(name) {
                    return Ok(Arc::clone(bean));
                }

                tracing::info!("Creating shared instance of singleton bean '{}'", name);

                let bean = self.create_bean(&definition)?;

                let mut singletons = self.singletons.write();
                let bean = match singletons.entry(name.to_string()) {
                    // 创建过程中被递归创建过，保留先缓存的实例
                    Entry::Occupied(existing) => Arc::clone(existing.get()),
                    Entry::Vacant(slot) => {
                        self.singleton_order.lock().push(name.to_string());
                        Arc::clone(slot.insert(bean))
                    }
                };

                tracing::debug!("Singleton bean '{}' created and cached", name);
                Ok(bean)
            }
            Scope::Prototype => {
                tracing::debug!("Creating new instance of prototype bean '{}'", name);
                self.create_bean(&definition)
            }
        }
    }

    fn get_bean_by_type_id(
        &self,
        type_id: TypeId,
        type_name: &str,
    ) -> ContainerResult<SharedBean> {
        let candidates = self.get_bean_names_for_type(type_id);

        match candidates.len() {
            0 => Err(ContainerError::BeanNotFound(format!(
                "No bean found for type '{}'",
                type_name
            ))),
            1 => self.get_bean(&candidates[0]),
            _ => Err(ContainerError::NoUniqueBean {
                type_name: type_name.to_string(),
                candidates,
            }),
        }
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.definitions.read().contains_key(name)
    }

    fn contains_bean_of_type_id(&self, type_id: TypeId) -> bool {
        self.type_to_names
            .read()
            .get(&type_id)
            .is_some_and(|names| !names.is_empty())
    }

    fn get_bean_type_name(&self, name: &str) -> Option<&'static str> {
        self.definitions
            .read()
            .get(name)
            .map(|definition| definition.factory.bean_type_name())
    }
}

impl ListableBeanFactory for DefaultListableBeanFactory {
    fn get_bean_names(&self) -> Vec<String> {
        self.definition_names.read().clone()
    }

    fn get_bean_names_for_type(&self, type_id: TypeId) -> Vec<String> {
        self.type_to_names
            .read()
            .get(&type_id)
            .cloned()
            .unwrap_or_default()
    }

    fn get_bean_names_for_role(&self, role: BeanRole) -> Vec<String> {
        let definitions = self.definitions.read();
        self.definition_names
            .read()
            .iter()
            .filter(|name| definitions.get(*name).is_some_and(|def| def.role == role))
            .cloned()
            .collect()
    }

    fn get_bean_definition_count(&self) -> usize {
        self.definitions.read().len()
    }
}

impl BeanDefinitionRegistry for DefaultListableBeanFactory {
    fn register_bean_definition(&self, definition: BeanDefinition) -> ContainerResult<()> {
        self.ensure_not_frozen("register")?;

        let name = definition.name.clone();
        let type_id = definition.factory.bean_type_id();

        tracing::trace!(
            "Attempting to register bean: name='{}', type='{}', scope={:?}",
            name,
            definition.factory.bean_type_name(),
            definition.scope
        );

        {
            let mut definitions = self.definitions.write();
            if definitions.contains_key(&name) {
                tracing::warn!("Bean '{}' already exists, registration failed", name);
                return Err(ContainerError::BeanAlreadyExists(name));
            }
            definitions.insert(name.clone(), Arc::new(definition));
        }

        self.definition_names.write().push(name.clone());
        self.type_to_names
            .write()
            .entry(type_id)
            .or_default()
            .push(name.clone());

        tracing::debug!("Bean definition registered successfully: '{}'", name);
        Ok(())
    }

    fn contains_bean_definition(&self, name: &str) -> bool {
        self.definitions.read().contains_key(name)
    }

    fn remove_bean_definition(&self, name: &str) -> ContainerResult<()> {
        self.ensure_not_frozen("remove")?;

        let definition = self
            .definitions
            .write()
            .remove(name)
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))?;

        self.definition_names.write().retain(|n| n != name);
        if let Some(names) = self
            .type_to_names
            .write()
            .get_mut(&definition.factory.bean_type_id())
        {
            names.retain(|n| n != name);
        }
        self.singletons.write().remove(name);
        self.singleton_order.lock().retain(|n| n != name);

        tracing::debug!("Bean definition removed: '{}'", name);
        Ok(())
    }

    fn get_bean_definition(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>> {
        self.definition(name)
    }
}

impl ConfigurableListableBeanFactory for DefaultListableBeanFactory {
    fn preinstantiate_singletons(&self) -> ContainerResult<()> {
        let bean_names: Vec<String> = {
            let definitions = self.definitions.read();
            self.definition_names
                .read()
                .iter()
                .filter(|name| {
                    definitions
                        .get(*name)
                        .is_some_and(|def| def.is_singleton() && !def.lazy)
                })
                .cloned()
                .collect()
        };

        tracing::debug!("Pre-instantiating {} singleton beans", bean_names.len());

        for name in bean_names {
            self.get_bean(&name)?;
        }

        Ok(())
    }

    fn freeze_configuration(&self) {
        *self.configuration_frozen.write() = true;
        tracing::debug!("Bean factory configuration frozen");
    }

    fn is_configuration_frozen(&self) -> bool {
        *self.configuration_frozen.read()
    }

    fn destroy_singletons(&self) -> ContainerResult<()> {
        tracing::info!("Destroying singleton beans");

        let order: Vec<String> = std::mem::take(&mut *self.singleton_order.lock());
        let mut beans_to_destroy: Vec<(String, SharedBean)> = {
            let mut singletons = self.singletons.write();
            order
                .into_iter()
                .filter_map(|name| singletons.remove(&name).map(|bean| (name, bean)))
                .collect()
        };
        beans_to_destroy.reverse();

        // 单个 Bean 销毁失败不影响其余 Bean，返回第一个错误
        let mut first_error = None;

        for (name, mut bean) in beans_to_destroy {
            let definition = match self.definitions.read().get(&name) {
                Some(definition) => Arc::clone(definition),
                None => continue,
            };

            let Some(ref destroy_fn) = definition.destroy_callback else {
                continue;
            };

            // 只有引用计数为 1 时才能获取可变引用
            match Arc::get_mut(&mut bean) {
                Some(bean_mut) => match destroy_fn(bean_mut) {
                    Ok(()) => tracing::debug!("Bean '{}' destroyed successfully", name),
                    Err(e) => {
                        tracing::warn!("Failed to destroy bean '{}': {}", name, e);
                        first_error.get_or_insert(e);
                    }
                },
                None => {
                    tracing::warn!("Cannot destroy bean '{}': still has active references", name);
                }
            }
        }

        tracing::info!("Singleton beans destruction completed");
        first_error.map_or(Ok(()), Err)
    }

    fn get_dependency_graph(&self) -> HashMap<String, Vec<String>> {
        self.definitions
            .read()
            .iter()
            .map(|(name, definition)| (name.clone(), definition.dependencies.clone()))
            .collect()
    }
}
