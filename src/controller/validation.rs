//! Validation of user-supplied configuration resources

use k8s_openapi::api::core::v1::ConfigMap;

use crate::controller::error::{Error, Result};
use crate::resources::configmap::{HOST_PORT_PLACEHOLDER, SOLR_XML_KEY};

/// Validate a user-provided solr.xml ConfigMap and return the file contents.
///
/// Three distinct failure modes, all fatal configuration errors: an empty
/// ConfigMap, a missing solr.xml entry, and a solr.xml without the hostPort
/// placeholder the nodes substitute their assigned port into.
pub fn validate_custom_config_map<'a>(name: &str, config_map: &'a ConfigMap) -> Result<&'a str> {
    let data = config_map
        .data
        .as_ref()
        .filter(|data| !data.is_empty())
        .ok_or_else(|| Error::InvalidConfig(format!("provided ConfigMap {} has no data", name)))?;

    let solr_xml = data.get(SOLR_XML_KEY).ok_or_else(|| {
        Error::InvalidConfig(format!(
            "required '{}' key not found in provided ConfigMap {}",
            SOLR_XML_KEY, name
        ))
    })?;

    if !solr_xml.contains(HOST_PORT_PLACEHOLDER) {
        return Err(Error::InvalidConfig(format!(
            "custom solr.xml in ConfigMap {} must contain a placeholder for the 'hostPort' variable, such as <int name=\"hostPort\">${{hostPort:80}}</int>",
            name
        )));
    }

    Ok(solr_xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config_map(data: Option<BTreeMap<String, String>>) -> ConfigMap {
        ConfigMap {
            data,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_config_map_rejected() {
        let err = validate_custom_config_map("custom", &config_map(None)).unwrap_err();
        assert!(err.to_string().contains("has no data"));
        assert!(!err.is_retryable());

        let err =
            validate_custom_config_map("custom", &config_map(Some(BTreeMap::new()))).unwrap_err();
        assert!(err.to_string().contains("has no data"));
    }

    #[test]
    fn test_missing_solr_xml_entry_rejected() {
        let data = BTreeMap::from([("other.conf".to_string(), "x".to_string())]);
        let err = validate_custom_config_map("custom", &config_map(Some(data))).unwrap_err();
        assert!(err.to_string().contains("'solr.xml' key not found"));
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let data = BTreeMap::from([(
            "solr.xml".to_string(),
            "<solr><int name=\"hostPort\">80</int></solr>".to_string(),
        )]);
        let err = validate_custom_config_map("custom", &config_map(Some(data))).unwrap_err();
        assert!(err.to_string().contains("hostPort"));
    }

    #[test]
    fn test_valid_config_map_returns_contents() {
        let xml = "<solr><int name=\"hostPort\">${hostPort:80}</int></solr>";
        let data = BTreeMap::from([("solr.xml".to_string(), xml.to_string())]);
        let cm = config_map(Some(data));
        let contents = validate_custom_config_map("custom", &cm).unwrap();
        assert_eq!(contents, xml);
    }
}
