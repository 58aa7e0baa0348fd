//! 配置类支持
//!
//! 配置类是一个普通的结构体，它的 `#[bean]` 方法就是 Bean 的工厂方法。
//! 通常由 `#[configuration]` 宏生成 [`Configuration`] 的实现。

use std::sync::Arc;

use crate::bean_factory::BeanDefinitionRegistry;
use crate::error::ContainerResult;
use crate::utils::naming;

/// 配置类 trait
///
/// # Example
///
/// ```ignore
/// use sprig_core_macros::configuration;
///
/// struct AppConfig;
///
/// #[configuration]
/// impl AppConfig {
///     #[bean]
///     fn greeting(&self) -> String {
///         "hello".to_string()
///     }
/// }
/// ```
pub trait Configuration: Send + Sync + Sized + 'static {
    /// 配置类实例在容器中的名称，默认是类型名的 camelCase 形式
    fn configuration_name() -> String {
        naming::default_bean_name::<Self>()
    }

    /// 按声明顺序把所有 Bean 方法注册为 Bean 定义
    ///
    /// 生成的工厂持有 `config` 的共享引用，Bean 方法通过它调用
    fn register_bean_methods(
        config: &Arc<Self>,
        registry: &dyn BeanDefinitionRegistry,
    ) -> ContainerResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::{BeanDefinition, FunctionFactory};
    use crate::bean_factory::{BeanFactory, DefaultListableBeanFactory, ListableBeanFactory};

    struct PortConfig {
        port: u16,
    }

    impl Configuration for PortConfig {
        fn register_bean_methods(
            config: &Arc<Self>,
            registry: &dyn BeanDefinitionRegistry,
        ) -> ContainerResult<()> {
            let config = Arc::clone(config);
            registry.register_bean_definition(BeanDefinition::new(
                "port",
                FunctionFactory::new(move |_: &dyn BeanFactory| Ok(config.port)),
            ))
        }
    }

    #[test]
    fn test_default_configuration_name() {
        assert_eq!(PortConfig::configuration_name(), "portConfig");
    }

    #[test]
    fn test_register_bean_methods() {
        let factory = DefaultListableBeanFactory::new();
        let config = Arc::new(PortConfig { port: 8080 });

        PortConfig::register_bean_methods(&config, &factory).unwrap();

        assert_eq!(factory.get_bean_names(), vec!["port"]);
        let port = factory.get_bean("port").unwrap().downcast::<u16>().unwrap();
        assert_eq!(*port, 8080);
    }
}
