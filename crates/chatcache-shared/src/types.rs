use serde::{Deserialize, Serialize};

// Identifiers are plain integers on the wire; the newtypes keep a chat id
// from being passed where a user id is expected.

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ChatId(pub i64);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct UserId(pub i64);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct BasicGroupId(pub i64);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct SupergroupId(pub i64);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct FileId(pub i32);

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

impl_display!(ChatId, UserId, BasicGroupId, SupergroupId, FileId);

/// Value of a client option.  Options are global key/value settings pushed
/// by the session (e.g. `my_id`, `version`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum OptionValue {
    Boolean(bool),
    Empty,
    Integer(i64),
    String(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&(ChatId(-100), FileId(7))).unwrap();
        assert_eq!(json, "[-100,7]");
    }

    #[test]
    fn option_value_is_tagged() {
        let json = serde_json::to_value(OptionValue::Integer(42)).unwrap();
        assert_eq!(json["type"], "integer");
        assert_eq!(json["value"], 42);

        let empty = serde_json::to_value(OptionValue::Empty).unwrap();
        assert_eq!(empty["type"], "empty");
    }

    #[test]
    fn display_prints_inner_value() {
        assert_eq!(UserId(12345).to_string(), "12345");
        assert_eq!(SupergroupId(-1).to_string(), "-1");
    }
}
