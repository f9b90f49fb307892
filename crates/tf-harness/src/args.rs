//! Argument encoding - typed records to `-var` flags
//!
//! Every serialised field becomes one Terraform variable named after the
//! serde field name. Unset fields (see [`crate::value::is_zero`]) are left
//! out so the manifest's own defaults apply.
//!
//! Scalars are passed as-is (`name=value`). Maps, lists and lists of maps are
//! passed as a single variable holding the compact JSON literal of the value,
//! which Terraform parses as an HCL object/tuple expression:
//!
//! ```text
//! -var labels={"team":"qe"}
//! -var taints=[{"effect":"NoSchedule","key":"k","value":"v"}]
//! ```

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::TfError;
use crate::value::is_zero;
use crate::Result;

/// Variable names whose values must not reach the logs.
const SECRET_VARS: &[&str] = &["token", "password", "client_secret", "htpasswd_users"];

/// Encode an argument record as `-var name=value` flag pairs.
///
/// Variables are emitted in name order.
pub fn encode_vars<T: Serialize + ?Sized>(record: &T) -> Result<Vec<String>> {
    let value = serde_json::to_value(record)?;
    let Value::Object(fields) = value else {
        return Err(TfError::Encode(format!(
            "argument record must serialise to an object, got {}",
            value_kind(&value)
        )));
    };

    let mut flags = Vec::with_capacity(fields.len() * 2);
    let mut names: Vec<&String> = fields.keys().collect();
    names.sort();

    for name in names {
        let value = &fields[name];
        if is_zero(value) {
            continue;
        }
        flags.push("-var".to_string());
        flags.push(format!("{}={}", name, render_value(value)?));
    }

    Ok(flags)
}

/// Encode an argument record followed by caller-supplied extra flags.
pub fn combine_args<T: Serialize + ?Sized>(record: &T, extra: &[String]) -> Result<Vec<String>> {
    let mut flags = encode_vars(record)?;
    flags.extend(extra.iter().cloned());
    Ok(flags)
}

/// Encode variable files as `-var-file=<path>` flags, in the order given.
///
/// Terraform lets later files override earlier ones.
pub fn encode_var_files<P: AsRef<Path>>(files: &[P]) -> Vec<String> {
    files
        .iter()
        .map(|f| format!("-var-file={}", f.as_ref().display()))
        .collect()
}

/// Copy of `flags` with secret variable values masked, for logging.
pub fn redact(flags: &[String]) -> Vec<String> {
    flags
        .iter()
        .map(|flag| match flag.split_once('=') {
            Some((name, _)) if SECRET_VARS.contains(&name) => format!("{}=***", name),
            _ => flag.clone(),
        })
        .collect()
}

fn render_value(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Array(_) | Value::Object(_) => Ok(serde_json::to_string(value)?),
        Value::Null => Err(TfError::Encode("null has no variable form".to_string())),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Default, Serialize)]
    struct PoolArgs {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        replicas: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_spot_price: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        autoscaling_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        labels: Option<BTreeMap<String, String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        taints: Option<Vec<BTreeMap<String, String>>>,
        #[serde(rename = "ocm_environment", skip_serializing_if = "Option::is_none")]
        ocm_env: Option<String>,
    }

    #[test]
    fn test_encode_scalars_sorted() {
        let args = PoolArgs {
            name: Some("mp-1".to_string()),
            replicas: Some(3),
            autoscaling_enabled: Some(true),
            max_spot_price: Some(0.25),
            ..Default::default()
        };
        let flags = encode_vars(&args).unwrap();
        assert_eq!(
            flags,
            vec![
                "-var",
                "autoscaling_enabled=true",
                "-var",
                "max_spot_price=0.25",
                "-var",
                "name=mp-1",
                "-var",
                "replicas=3",
            ]
        );
    }

    #[test]
    fn test_zero_values_are_omitted() {
        let args = PoolArgs {
            name: Some(String::new()),
            replicas: Some(0),
            autoscaling_enabled: Some(false),
            labels: Some(BTreeMap::new()),
            taints: Some(Vec::new()),
            ..Default::default()
        };
        assert!(encode_vars(&args).unwrap().is_empty());
    }

    #[test]
    fn test_structured_values_are_json_literals() {
        let mut labels = BTreeMap::new();
        labels.insert("team".to_string(), "qe".to_string());
        let mut taint = BTreeMap::new();
        taint.insert("key".to_string(), "k".to_string());
        taint.insert("effect".to_string(), "NoSchedule".to_string());

        let args = PoolArgs {
            labels: Some(labels),
            taints: Some(vec![taint]),
            ..Default::default()
        };
        let flags = encode_vars(&args).unwrap();
        assert_eq!(
            flags,
            vec![
                "-var",
                r#"labels={"team":"qe"}"#,
                "-var",
                r#"taints=[{"effect":"NoSchedule","key":"k"}]"#,
            ]
        );
    }

    #[test]
    fn test_declared_rename_is_used() {
        let args = PoolArgs {
            ocm_env: Some("staging".to_string()),
            ..Default::default()
        };
        assert_eq!(
            encode_vars(&args).unwrap(),
            vec!["-var", "ocm_environment=staging"]
        );
    }

    #[test]
    fn test_non_object_record_is_rejected() {
        let err = encode_vars(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, TfError::Encode(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_combine_appends_extra_flags_last() {
        let args = PoolArgs {
            name: Some("a".to_string()),
            ..Default::default()
        };
        let flags = combine_args(&args, &["-parallelism=1".to_string()]).unwrap();
        assert_eq!(flags, vec!["-var", "name=a", "-parallelism=1"]);
    }

    #[test]
    fn test_var_files_keep_order() {
        let flags = encode_var_files(&["base.tfvars", "override.tfvars"]);
        assert_eq!(
            flags,
            vec!["-var-file=base.tfvars", "-var-file=override.tfvars"]
        );
    }

    #[test]
    fn test_redact_masks_secrets_only() {
        let flags = vec![
            "-var".to_string(),
            "token=abc".to_string(),
            "-var".to_string(),
            "name=idp".to_string(),
        ];
        assert_eq!(redact(&flags), vec!["-var", "token=***", "-var", "name=idp"]);
    }
}
