//! 框架内部使用的名称常量
//!
//! 宏、容器和应用启动器共用这些标识符

/// Environment 在容器中的 Bean 名称
pub const ENVIRONMENT_BEAN_NAME: &str = "environment";

/// 默认配置文件
pub const DEFAULT_CONFIG_FILE: &str = "application.toml";

/// 默认环境变量前缀
pub const DEFAULT_ENV_PREFIX: &str = "SPRIG_";

/// 激活 profile 的环境变量后缀，完整名称为 `<prefix>PROFILES_ACTIVE`
pub const PROFILES_ACTIVE_SUFFIX: &str = "PROFILES_ACTIVE";
