// sprig-core: 基于配置类的依赖注入容器
//
// 提供类型安全的依赖注入功能，支持：
// - 单例和原型作用域
// - 配置类的 Bean 方法（通过 #[configuration] 宏）
// - 通过容器查找依赖，保证单例语义
// - 生命周期管理（init/destroy 回调）

pub mod app;
pub mod bean;
pub mod bean_factory;
pub mod config;
pub mod configuration;
pub mod constants;
pub mod context;
pub mod error;
pub mod logging;
pub mod scope;
pub mod utils;

/// init/destroy 方法的返回值转换
///
/// 允许 `()` 和 `ContainerResult<()>` 两种返回类型
pub trait IntoResult {
    fn into_result(self) -> ContainerResult<()>;
}

impl IntoResult for () {
    fn into_result(self) -> ContainerResult<()> {
        Ok(())
    }
}

impl IntoResult for ContainerResult<()> {
    fn into_result(self) -> ContainerResult<()> {
        self
    }
}

// 重新导出常用类型
pub use app::SprigApplication;
pub use bean::{BeanDefinition, FunctionFactory, InstanceFactory, ObjectFactory, SharedBean};
pub use bean_factory::{
    BeanDefinitionRegistry, BeanFactory, BeanFactoryExt, ConfigurableListableBeanFactory,
    DefaultListableBeanFactory, ListableBeanFactory,
};
pub use config::{
    ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, PropertySource,
    TomlPropertySource,
};
pub use configuration::Configuration;
pub use constants::*;
pub use context::{ApplicationContext, ApplicationContextBuilder, ShutdownHook};
pub use error::{ApplicationError, ApplicationResult, ContainerError, ContainerResult};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use scope::{BeanRole, Scope};

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::app::SprigApplication;
    pub use crate::bean::BeanDefinition;
    pub use crate::bean_factory::{
        BeanDefinitionRegistry, BeanFactory, BeanFactoryExt, ConfigurableListableBeanFactory,
        ListableBeanFactory,
    };
    pub use crate::config::{ConfigValue, Environment};
    pub use crate::configuration::Configuration;
    pub use crate::context::ApplicationContext;
    pub use crate::error::{ApplicationError, ApplicationResult, ContainerError, ContainerResult};
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    pub use crate::scope::{BeanRole, Scope};
}
