//! Parsed views over `terraform output -json` and `terraform show -json`.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::dig::{
    dig, dig_array, dig_as, dig_bool, dig_float, dig_int, dig_string, dig_string_map,
};

/// Declared outputs keyed by name, each entry shaped
/// `{ "value": <any>, "type": ..., "sensitive": ... }`.
///
/// The document is kept exactly as Terraform printed it; paths into it
/// therefore usually end in `"value"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Outputs(Value);

impl Default for Outputs {
    fn default() -> Self {
        Outputs(Value::Object(Map::new()))
    }
}

impl Outputs {
    /// Parse the stdout of `terraform output -json`.
    ///
    /// Blank output (no outputs declared, or empty state) parses as empty.
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let map: Map<String, Value> = serde_json::from_str(raw)?;
        Ok(Outputs(Value::Object(map)))
    }

    pub fn from_value(value: Value) -> Self {
        Outputs(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Names of the declared outputs.
    pub fn names(&self) -> Vec<&str> {
        self.0
            .as_object()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The whole entry for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The `value` field of output `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        dig(&self.0, &[name, "value"])
    }

    pub fn dig(&self, path: &[&str]) -> Option<&Value> {
        dig(&self.0, path)
    }

    pub fn string(&self, path: &[&str]) -> String {
        dig_string(&self.0, path)
    }

    pub fn int(&self, path: &[&str]) -> i64 {
        dig_int(&self.0, path)
    }

    pub fn float(&self, path: &[&str]) -> f64 {
        dig_float(&self.0, path)
    }

    pub fn bool(&self, path: &[&str]) -> bool {
        dig_bool(&self.0, path)
    }

    pub fn string_map(&self, path: &[&str]) -> BTreeMap<String, String> {
        dig_string_map(&self.0, path)
    }

    pub fn array(&self, path: &[&str]) -> &[Value] {
        dig_array(&self.0, path)
    }

    pub fn as_type<T: DeserializeOwned + Default>(&self, path: &[&str]) -> T {
        dig_as(&self.0, path)
    }
}

/// The state document printed by `terraform show -json`.
#[derive(Debug, Clone, PartialEq)]
pub struct State(Value);

impl State {
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(State(Value::Object(Map::new())));
        }
        Ok(State(serde_json::from_str(raw)?))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Attribute values of the resource or data source `type_name.name`,
    /// searched through the root module and all child modules.
    pub fn resource(&self, type_name: &str, name: &str) -> Option<&Value> {
        let root = dig(&self.0, &["values", "root_module"])?;
        find_in_module(root, type_name, name)
    }
}

fn find_in_module<'a>(module: &'a Value, type_name: &str, name: &str) -> Option<&'a Value> {
    let hit = dig_array(module, &["resources"]).iter().find(|r| {
        r.get("type").and_then(Value::as_str) == Some(type_name)
            && r.get("name").and_then(Value::as_str) == Some(name)
    });
    if let Some(resource) = hit {
        return resource.get("values");
    }
    dig_array(module, &["child_modules"])
        .iter()
        .find_map(|child| find_in_module(child, type_name, name))
}
