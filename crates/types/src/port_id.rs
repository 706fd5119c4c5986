use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// Message port identifier
///
/// Handlers can be addressed by their numeric index or by their symbolic
/// name. Both schemes resolve against the same handler set of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortId {
    /// Numeric index of the port
    Index(usize),
    /// Name of the port
    Name(String),
}

impl From<usize> for PortId {
    fn from(item: usize) -> Self {
        PortId::Index(item)
    }
}

impl From<&str> for PortId {
    fn from(item: &str) -> Self {
        match item.parse::<usize>() {
            Ok(i) => PortId::Index(i),
            Err(_) => PortId::Name(item.to_string()),
        }
    }
}

impl From<String> for PortId {
    fn from(item: String) -> Self {
        match item.parse::<usize>() {
            Ok(i) => PortId::Index(i),
            Err(_) => PortId::Name(item),
        }
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortId::Index(i) => write!(f, "{}", i),
            PortId::Name(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!(PortId::from("0"), PortId::Index(0));
        assert_eq!(PortId::from("42"), PortId::Index(42));
        assert_eq!(PortId::from("gain"), PortId::Name("gain".to_string()));
        assert_eq!(PortId::from("in0"), PortId::Name("in0".to_string()));
        assert_eq!(PortId::from(3usize), PortId::Index(3));
    }
}
