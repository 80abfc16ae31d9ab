use tracing::debug;

use invoice_finance_core::policy::FinancingPolicy;

use crate::input;

/// Load the financing policy from a YAML (or JSON) file, falling back to defaults.
pub fn load_policy(path: Option<&str>) -> Result<FinancingPolicy, Box<dyn std::error::Error>> {
    let policy = match path {
        Some(path) => {
            let contents = input::file::read_to_string(path)?;
            let policy: FinancingPolicy = serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse policy '{}': {}", path, e))?;
            debug!(path, "loaded financing policy");
            policy
        }
        None => FinancingPolicy::default(),
    };
    policy.validate()?;
    debug!(
        default_discount = %policy.default_discount,
        recovery_rate = %policy.writeoff.recovery_rate,
        "financing policy in effect"
    );
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!("ifin-{}-{}", std::process::id(), name));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_default_policy_without_file() {
        let policy = load_policy(None).unwrap();
        assert_eq!(policy, FinancingPolicy::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let path = write_temp("partial.yaml", "writeoff:\n  recovery_rate: \"0.25\"\n");
        let policy = load_policy(Some(&path)).unwrap();
        assert_eq!(policy.default_discount, dec!(0.10));
        assert_eq!(policy.writeoff.recovery_rate, dec!(0.25));
    }

    #[test]
    fn test_out_of_range_policy_rejected() {
        let path = write_temp("bad.yaml", "default_discount: \"1.5\"\n");
        assert!(load_policy(Some(&path)).is_err());
    }
}
