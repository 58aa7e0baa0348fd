use std::str::FromStr;

/// Bean 的作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// 单例模式 - 容器中只有一个实例
    #[default]
    Singleton,

    /// 原型模式 - 每次请求都创建新实例
    Prototype,
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "singleton" => Ok(Scope::Singleton),
            "prototype" => Ok(Scope::Prototype),
            _ => Err(format!("Invalid scope: {}", s)),
        }
    }
}

/// Bean 的角色
///
/// `Infrastructure` 表示框架内部注册的 Bean（Environment、配置类实例等），
/// 不会出现在应用级别的 Bean 名称列表中
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeanRole {
    #[default]
    Application,
    Infrastructure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_str() {
        assert_eq!("singleton".parse::<Scope>().unwrap(), Scope::Singleton);
        assert_eq!("Prototype".parse::<Scope>().unwrap(), Scope::Prototype);
        assert!("request".parse::<Scope>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Scope::default(), Scope::Singleton);
        assert_eq!(BeanRole::default(), BeanRole::Application);
    }
}
