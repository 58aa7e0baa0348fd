//! 统一的错误类型
//!
//! 容器层使用 [`ContainerError`]，应用启动层使用 [`ApplicationError`]。
//! 不透明的底层错误统一包装为 `anyhow::Error`。

use thiserror::Error;

/// 容器操作的结果类型
pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

/// 应用启动的结果类型
pub type ApplicationResult<T> = std::result::Result<T, ApplicationError>;

/// 容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 找不到指定的 Bean
    #[error("Bean not found: {0}")]
    BeanNotFound(String),

    /// 同名 Bean 已注册
    #[error("Bean '{0}' already exists")]
    BeanAlreadyExists(String),

    /// 按类型查找时存在多个候选
    #[error("Expected a single bean of type '{type_name}' but found {}: {}", .candidates.len(), .candidates.join(", "))]
    NoUniqueBean {
        type_name: String,
        candidates: Vec<String>,
    },

    /// 类型转换失败
    #[error("Bean type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    /// 循环依赖
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    /// Bean 创建失败
    #[error("Failed to create bean {0}")]
    BeanCreationFailed(String),

    /// 依赖校验失败
    #[error("Dependency validation failed: {0}")]
    DependencyValidationFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 应用启动错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// 日志系统初始化失败
    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),

    /// 配置文件加载失败
    #[error("Failed to load configuration: {0}")]
    ConfigLoadFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_unique_bean_message_lists_candidates() {
        let err = ContainerError::NoUniqueBean {
            type_name: "Foo".to_string(),
            candidates: vec!["foo".to_string(), "otherFoo".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Expected a single bean of type 'Foo' but found 2: foo, otherFoo"
        );
    }

    #[test]
    fn test_container_error_converts_into_application_error() {
        let err: ApplicationError = ContainerError::BeanNotFound("foo".to_string()).into();
        assert!(matches!(err, ApplicationError::Container(ContainerError::BeanNotFound(_))));
        assert_eq!(err.to_string(), "Bean not found: foo");
    }
}
