use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bean_factory::{
    BeanDefinitionRegistry, BeanFactory, ConfigurableListableBeanFactory,
    DefaultListableBeanFactory, ListableBeanFactory,
};
use crate::configuration::Configuration;
use crate::utils::dependency::validate_dependency_graph;
use crate::{
    bean::{BeanDefinition, FunctionFactory, SharedBean},
    config::{Environment, PropertySource},
    constants,
    error::{ContainerError, ContainerResult},
    BeanRole, Scope,
};

/// Shutdown hook 类型
pub type ShutdownHook = Box<dyn Fn() -> ContainerResult<()> + Send + Sync>;

/// 应用上下文
///
/// 持有 BeanFactory 和 Environment，是启动时创建、退出时丢弃的显式值，
/// 不存在全局容器
pub struct ApplicationContext {
    /// Bean 工厂 - 负责 Bean 的创建和管理
    bean_factory: DefaultListableBeanFactory,

    /// 配置环境
    environment: Arc<Environment>,

    /// Shutdown hooks（按注册顺序执行）
    shutdown_hooks: RwLock<Vec<ShutdownHook>>,

    /// 应用名称
    app_name: RwLock<Option<String>>,

    /// 是否已经 refresh
    refreshed: AtomicBool,
}

impl ApplicationContext {
    fn new(environment: Environment) -> Self {
        Self {
            bean_factory: DefaultListableBeanFactory::new(),
            environment: Arc::new(environment),
            shutdown_hooks: RwLock::new(Vec::new()),
            app_name: RwLock::new(None),
            refreshed: AtomicBool::new(false),
        }
    }

    pub fn builder() -> ApplicationContextBuilder {
        ApplicationContextBuilder::new()
    }

    pub fn set_app_name(&self, name: impl Into<String>) {
        *self.app_name.write() = Some(name.into());
    }

    pub fn app_name(&self) -> Option<String> {
        self.app_name.read().clone()
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.environment
    }

    pub fn bean_factory(&self) -> &DefaultListableBeanFactory {
        &self.bean_factory
    }

    /// 注册 shutdown hook
    pub fn register_shutdown_hook<F>(&self, hook: F)
    where
        F: Fn() -> ContainerResult<()> + Send + Sync + 'static,
    {
        self.shutdown_hooks.write().push(Box::new(hook));
    }

    /// 使用闭包注册 Bean
    ///
    /// 工厂闭包通过传入的 `&dyn BeanFactory` 获取依赖
    pub fn register_bean<T, F>(
        &self,
        name: impl Into<String>,
        scope: Scope,
        factory: F,
    ) -> ContainerResult<()>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn BeanFactory) -> ContainerResult<T> + Send + Sync + 'static,
    {
        let definition = BeanDefinition::new(name, FunctionFactory::new(factory)).with_scope(scope);
        self.register_bean_definition(definition)
    }

    /// 注册单例 Bean
    pub fn register_singleton<T, F>(&self, name: impl Into<String>, factory: F) -> ContainerResult<()>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn BeanFactory) -> ContainerResult<T> + Send + Sync + 'static,
    {
        self.register_bean(name, Scope::Singleton, factory)
    }

    /// 注册原型 Bean
    pub fn register_prototype<T, F>(&self, name: impl Into<String>, factory: F) -> ContainerResult<()>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn BeanFactory) -> ContainerResult<T> + Send + Sync + 'static,
    {
        self.register_bean(name, Scope::Prototype, factory)
    }

    /// 注册配置类
    ///
    /// 配置类实例本身作为基础设施 Bean 注册，然后按声明顺序注册它的 Bean 方法。
    /// 返回共享的配置类实例
    pub fn register_configuration<C: Configuration>(&self, config: C) -> ContainerResult<Arc<C>> {
        let config = Arc::new(config);
        let name = C::configuration_name();

        tracing::debug!("Registering configuration '{}'", name);

        self.register_bean_definition(
            BeanDefinition::from_instance(name.clone(), Arc::clone(&config))
                .with_role(BeanRole::Infrastructure),
        )?;
        C::register_bean_methods(&config, self)?;

        tracing::debug!("Configuration '{}' registered", name);
        Ok(config)
    }

    /// 验证所有 Bean 的依赖关系
    ///
    /// 检查：
    /// - 缺失的依赖（声明的依赖没有注册）
    /// - 循环依赖（A -> B -> C -> A）
    pub fn validate_dependencies(&self) -> ContainerResult<()> {
        let graph = self.bean_factory.get_dependency_graph();

        validate_dependency_graph(&graph)
            .map_err(|e| ContainerError::DependencyValidationFailed(e.to_string()))?;

        tracing::debug!("Dependency validation passed for {} bean(s)", graph.len());
        Ok(())
    }

    /// 刷新上下文
    ///
    /// 验证依赖、创建所有非延迟加载的单例，然后冻结配置。只能调用一次
    pub fn refresh(&self) -> ContainerResult<()> {
        if self.refreshed.swap(true, Ordering::SeqCst) {
            return Err(ContainerError::Other(anyhow::anyhow!(
                "ApplicationContext has already been refreshed"
            )));
        }

        tracing::debug!("Refreshing ApplicationContext");

        self.validate_dependencies()?;
        self.bean_factory.preinstantiate_singletons()?;
        self.bean_factory.freeze_configuration();

        tracing::info!(
            "ApplicationContext refreshed with {} bean definition(s)",
            self.bean_factory.get_bean_definition_count()
        );
        Ok(())
    }

    pub fn is_refreshed(&self) -> bool {
        self.refreshed.load(Ordering::SeqCst)
    }

    /// 应用级别的 Bean 名称（按注册顺序，不含框架内部 Bean）
    pub fn get_bean_definition_names(&self) -> Vec<String> {
        self.bean_factory.get_bean_names_for_role(BeanRole::Application)
    }

    /// 关闭上下文
    ///
    /// 先按注册顺序执行 shutdown hooks（失败只记录日志），再销毁单例 Bean
    pub fn shutdown(&self) -> ContainerResult<()> {
        tracing::info!("Starting application shutdown");

        let hooks = std::mem::take(&mut *self.shutdown_hooks.write());
        tracing::debug!("Executing {} shutdown hook(s)", hooks.len());
        for (idx, hook) in hooks.iter().enumerate() {
            match hook() {
                Ok(()) => tracing::debug!("Shutdown hook {} executed successfully", idx + 1),
                Err(e) => tracing::warn!("Shutdown hook {} failed: {}", idx + 1, e),
            }
        }

        self.bean_factory.destroy_singletons()?;

        tracing::info!("Application shutdown complete");
        Ok(())
    }
}

impl BeanFactory for ApplicationContext {
    fn get_bean(&self, name: &str) -> ContainerResult<SharedBean> {
        self.bean_factory.get_bean(name)
    }

    fn get_bean_by_type_id(
        &self,
        type_id: TypeId,
        type_name: &str,
    ) -> ContainerResult<SharedBean> {
        self.bean_factory.get_bean_by_type_id(type_id, type_name)
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.bean_factory.contains_bean(name)
    }

    fn contains_bean_of_type_id(&self, type_id: TypeId) -> bool {
        self.bean_factory.contains_bean_of_type_id(type_id)
    }

    fn get_bean_type_name(&self, name: &str) -> Option<&'static str> {
        self.bean_factory.get_bean_type_name(name)
    }
}

impl ListableBeanFactory for ApplicationContext {
    fn get_bean_names(&self) -> Vec<String> {
        self.bean_factory.get_bean_names()
    }

    fn get_bean_names_for_type(&self, type_id: TypeId) -> Vec<String> {
        self.bean_factory.get_bean_names_for_type(type_id)
    }

    fn get_bean_names_for_role(&self, role: BeanRole) -> Vec<String> {
        self.bean_factory.get_bean_names_for_role(role)
    }

    fn get_bean_definition_count(&self) -> usize {
        self.bean_factory.get_bean_definition_count()
    }
}

impl BeanDefinitionRegistry for ApplicationContext {
    fn register_bean_definition(&self, definition: BeanDefinition) -> ContainerResult<()> {
        self.bean_factory.register_bean_definition(definition)
    }

    fn contains_bean_definition(&self, name: &str) -> bool {
        self.bean_factory.contains_bean_definition(name)
    }

    fn remove_bean_definition(&self, name: &str) -> ContainerResult<()> {
        self.bean_factory.remove_bean_definition(name)
    }

    fn get_bean_definition(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>> {
        self.bean_factory.get_bean_definition(name)
    }
}

/// 应用上下文构建器
pub struct ApplicationContextBuilder {
    environment: Environment,
}

impl ApplicationContextBuilder {
    pub fn new() -> Self {
        Self {
            environment: Environment::new(),
        }
    }

    /// 添加配置源到 Environment
    pub fn add_property_source(self, source: Box<dyn PropertySource>) -> Self {
        self.environment.add_property_source(source);
        self
    }

    /// 设置激活的 profiles
    pub fn set_active_profiles(self, profiles: Vec<String>) -> Self {
        self.environment.set_active_profiles(profiles);
        self
    }

    /// 构建上下文并注册框架内部 Bean
    pub fn build(self) -> ContainerResult<Arc<ApplicationContext>> {
        let context = Arc::new(ApplicationContext::new(self.environment));

        Self::register_environment(&context).map_err(|e| {
            tracing::error!("Failed to register core components: {}", e);
            e
        })?;

        Ok(context)
    }

    /// 注册 Environment 到容器
    ///
    /// Bean 名称: "environment"，类型: Environment
    fn register_environment(context: &ApplicationContext) -> ContainerResult<()> {
        let definition = BeanDefinition::from_instance(
            constants::ENVIRONMENT_BEAN_NAME,
            Arc::clone(context.environment()),
        )
        .with_role(BeanRole::Infrastructure);

        context.register_bean_definition(definition)?;

        tracing::debug!("Environment registered as bean '{}'", constants::ENVIRONMENT_BEAN_NAME);
        Ok(())
    }
}

impl Default for ApplicationContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
