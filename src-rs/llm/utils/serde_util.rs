use serde::{Deserialize, Deserializer};

pub fn deserialize_u64_lax<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wrapper {
        Str(String),
        Num(u64),
    }

    match Wrapper::deserialize(deserializer)? {
        Wrapper::Num(n) => Ok(n),
        Wrapper::Str(s) => s.trim().parse::<u64>().map_err(serde::de::Error::custom),
    }
}

pub fn deserialize_u32_lax<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wrapper {
        Str(String),
        Num(u32),
    }

    match Wrapper::deserialize(deserializer)? {
        Wrapper::Num(n) => Ok(n),
        Wrapper::Str(s) => s.trim().parse::<u32>().map_err(serde::de::Error::custom),
    }
}

/// Models frequently quote numbers ("0.8"); accept both forms.
pub fn deserialize_f64_lax<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wrapper {
        Str(String),
        Num(f64),
    }

    match Wrapper::deserialize(deserializer)? {
        Wrapper::Num(n) => Ok(n),
        Wrapper::Str(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

/// Like [`deserialize_f64_lax`], with `null` read as `0.0`.
pub fn deserialize_f64_lax_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wrapper {
        Str(String),
        Num(f64),
    }

    match Option::<Wrapper>::deserialize(deserializer)? {
        Some(Wrapper::Num(n)) => Ok(n),
        Some(Wrapper::Str(s)) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
        None => Ok(0.0),
    }
}

/// Explicit `null` behaves like a missing field.
pub fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn deserialize_bool_lax<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wrapper {
        Str(String),
        Bool(bool),
    }

    match Wrapper::deserialize(deserializer)? {
        Wrapper::Bool(b) => Ok(b),
        Wrapper::Str(s) => match s.to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(serde::de::Error::custom(format!(
                "invalid boolean string: {}",
                s
            ))),
        },
    }
}

/// Identifiers may arrive as strings or bare numbers.
pub fn deserialize_opt_string_lax<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wrapper {
        Str(String),
        Int(i64),
        Float(f64),
    }

    match Option::<Wrapper>::deserialize(deserializer)? {
        Some(Wrapper::Str(s)) => Ok(Some(s)),
        Some(Wrapper::Int(n)) => Ok(Some(n.to_string())),
        Some(Wrapper::Float(n)) => Ok(Some(n.to_string())),
        None => Ok(None),
    }
}
