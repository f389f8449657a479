//! Serde helpers for record references
//!
//! 支持两种 RecordId 格式的反序列化：
//! - 字符串格式 "table:id" (来自 API JSON，以及本库写入的关系字段)
//! - SurrealDB 原生格式 (来自数据库的 id 字段)
//!
//! 序列化统一输出 "table:id" 字符串，关系字段因此以字符串形式落库。

use serde::{Deserialize, Deserializer, Serializer};
use surrealdb::RecordId;

/// Deserialize bool that treats null as true
pub fn bool_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(|opt| opt.unwrap_or(true))
}

/// 内部辅助：同时支持字符串和原生 RecordId 格式
#[derive(Debug, Clone)]
struct FlexibleRecordId(RecordId);

impl<'de> Deserialize<'de> for FlexibleRecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct FlexibleVisitor;

        impl<'de> Visitor<'de> for FlexibleVisitor {
            type Value = FlexibleRecordId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string 'table:id' or RecordId")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse::<RecordId>()
                    .map(FlexibleRecordId)
                    .map_err(|_| de::Error::custom(format!("invalid RecordId: {}", value)))
            }

            fn visit_map<M>(self, map: M) -> Result<Self::Value, M::Error>
            where
                M: de::MapAccess<'de>,
            {
                RecordId::deserialize(de::value::MapAccessDeserializer::new(map))
                    .map(FlexibleRecordId)
            }
        }

        deserializer.deserialize_any(FlexibleVisitor)
    }
}

/// Option<RecordId> serialization
pub mod option_record_id {
    use super::*;

    pub fn serialize<S>(id: &Option<RecordId>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match id {
            Some(id) => s.serialize_some(&id.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<RecordId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<FlexibleRecordId>::deserialize(d).map(|opt| opt.map(|f| f.0))
    }
}

/// Nullable reference in update payloads
///
/// - field absent → `None` (leave unchanged)
/// - `null` → `Some(None)` (clear)
/// - `"table:id"` → `Some(Some(id))`
///
/// Use with `#[serde(default, skip_serializing_if = "Option::is_none")]`.
pub mod nullable_record_id {
    use super::*;

    pub fn serialize<S>(id: &Option<Option<RecordId>>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match id {
            Some(Some(id)) => s.serialize_some(&id.to_string()),
            _ => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<Option<RecordId>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<FlexibleRecordId>::deserialize(d).map(|opt| Some(opt.map(|f| f.0)))
    }
}

/// 三态可选值：字段缺失 = 不修改，`null` = 清空，有值 = 设置
///
/// 配合 `#[serde(default, skip_serializing_if = "Option::is_none")]` 使用，
/// 清空时序列化为 `null`，MERGE 会把字段置空。
pub mod nullable {
    use super::*;
    use serde::Serialize;

    pub fn serialize<T, S>(value: &Option<Option<T>>, s: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(Some(v)) => s.serialize_some(v),
            _ => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(d: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(d).map(Some)
    }
}

/// Vec<RecordId> serialization
pub mod vec_record_id {
    use super::*;

    pub fn serialize<S>(ids: &[RecordId], s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = s.serialize_seq(Some(ids.len()))?;
        for id in ids {
            seq.serialize_element(&id.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Vec<RecordId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Vec<FlexibleRecordId>>::deserialize(d)
            .map(|v| v.unwrap_or_default().into_iter().map(|f| f.0).collect())
    }
}

/// Option<Vec<RecordId>> serialization
pub mod option_vec_record_id {
    use super::*;

    pub fn serialize<S>(ids: &Option<Vec<RecordId>>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match ids {
            Some(ids) => super::vec_record_id::serialize(ids, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<Vec<RecordId>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Vec<FlexibleRecordId>>::deserialize(d)
            .map(|opt| opt.map(|v| v.into_iter().map(|f| f.0).collect()))
    }
}

/// Sort and dedup references by their `table:id` form
pub fn dedup_record_ids(ids: &mut Vec<RecordId>) {
    ids.sort_by_key(|id| id.to_string());
    ids.dedup_by(|a, b| a.to_string() == b.to_string());
}
