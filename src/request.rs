use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::Method;
use serde_json::{Map, Value};

use crate::{signer::percent_encode, Error, Result, FILE_KEY};

/// `host/path/version`, each part trimmed of surrounding slashes.
///
/// The version goes after the path; the provider routes on that layout.
pub fn build_url(host: &str, path: &str, version: &str) -> String {
    format!(
        "{}/{}/{}",
        host.trim_matches('/'),
        path.trim_matches('/'),
        version.trim_matches('/')
    )
}

/// Static description of one API operation.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: Method,
    /// Path template, `{}` is replaced by the identifiers in order.
    pub path: &'static str,
    /// Keys checked in this order before anything is sent.
    pub required: &'static [&'static str],
}

impl Endpoint {
    pub fn path(&self, ids: &[u64]) -> String {
        let mut ids = ids.iter();
        let mut segments = self.path.split("{}");
        let mut path = segments.next().unwrap_or_default().to_string();
        for segment in segments {
            if let Some(id) = ids.next() {
                path.push_str(&id.to_string());
            }
            path.push_str(segment);
        }
        path
    }

    /// Fails with the first required key absent from `params`.
    pub fn check(&self, params: &Params) -> Result<()> {
        match self.required.iter().find(|key| !params.contains_key(key)) {
            Some(key) => Err(Error::MissingParameter(key.to_string())),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Json(Value),
    /// Raw bytes, sent as `urlencode(base64(bytes))`.
    Binary(Vec<u8>),
}

impl ParamValue {
    pub fn into_json(self) -> Value {
        match self {
            ParamValue::Json(value) => value,
            ParamValue::Binary(bytes) => Value::String(encode_file(&bytes)),
        }
    }

    /// Query string rendering of a scalar value.
    pub fn to_query_value(&self) -> String {
        match self {
            ParamValue::Json(Value::String(s)) => s.clone(),
            ParamValue::Json(Value::Null) => String::new(),
            ParamValue::Json(other) => other.to_string(),
            ParamValue::Binary(bytes) => encode_file(bytes),
        }
    }
}

macro_rules! json_param_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParamValue {
                fn from(value: $t) -> Self {
                    ParamValue::Json(Value::from(value))
                }
            }
        )*
    };
}

json_param_from!(Value, &str, String, bool, i32, i64, u32, u64, f64);

pub fn encode_file(bytes: &[u8]) -> String {
    percent_encode(&STANDARD.encode(bytes))
}

/// Request parameters of a resource call.
///
/// ```
/// use shapeways_oauth1::Params;
///
/// let params = Params::new()
///     .field("fileName", "cube.stl")
///     .field("hasRightsToModel", 1)
///     .field("acceptTermsAndConditions", 1)
///     .file(b"solid cube".to_vec());
/// assert!(params.contains_key("file"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.insert(key, value);
        self
    }

    /// Attach the model or photo payload under `file`.
    pub fn file<B: Into<Vec<u8>>>(self, bytes: B) -> Self {
        self.field(FILE_KEY, ParamValue::Binary(bytes.into()))
    }

    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Treat a textual `file` field as the raw file content.
    pub(crate) fn file_as_binary(mut self) -> Self {
        if let Some(ParamValue::Json(Value::String(text))) = self.0.get(FILE_KEY) {
            let bytes = text.clone().into_bytes();
            self.0.insert(FILE_KEY.to_string(), ParamValue::Binary(bytes));
        }
        self
    }

    /// Pairs for a url query, in key order.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_query_value()))
            .collect()
    }

    pub fn into_json(self) -> Map<String, Value> {
        self.0.into_iter().map(|(k, v)| (k, v.into_json())).collect()
    }

    /// JSON body for PUT / POST.
    pub fn to_json_body(&self) -> String {
        Value::Object(self.clone().into_json()).to_string()
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params(
            map.into_iter()
                .map(|(k, v)| (k, ParamValue::Json(v)))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<ParamValue>> std::iter::FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
