//! JSON serialization of results.

use serde::Serialize;

/// Serialize a result to a compact JSON string.
pub fn to_json<T: Serialize>(result: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(result)
}

/// Serialize a result to an indented JSON string.
pub fn to_json_pretty<T: Serialize>(result: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reliability::DesignPoint;

    #[test]
    fn test_design_point_json_fields() {
        let point = DesignPoint::new("FORM", 2.0);
        let json = to_json(&point).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["identifier"], "FORM");
        assert_eq!(value["reliability_index"], 2.0);
        assert!(value["probability_failure"].as_f64().unwrap() > 0.02);
        assert!(value["alphas"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_pretty_json_is_indented() {
        let point = DesignPoint::new("FORM", 1.0);
        assert!(to_json_pretty(&point).unwrap().contains("\n  \"identifier\""));
    }
}
