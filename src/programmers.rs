//! Programmer registration and dispatch
//!
//! Programmers are selected with a string of the form `name` or
//! `name:key1=value1,key2=value2`. Backends are compiled in through cargo
//! features; only enabled ones are listed and accepted.

use nrfprog_core::programmer::{Programmer, ProgrammerInfo};

/// Parsed programmer parameters
#[derive(Debug, PartialEq, Eq)]
pub struct ProgrammerParams {
    /// Programmer name as given
    pub name: String,
    /// Key-value parameters, in the order given
    pub params: Vec<(String, String)>,
}

impl ProgrammerParams {
    /// Parameters as borrowed pairs, the form backend constructors take
    pub fn options(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Parse a programmer string into name and parameters
pub fn parse_programmer_params(s: &str) -> Result<ProgrammerParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));
    if name.is_empty() {
        return Err("Empty programmer name".into());
    }

    let mut params = Vec::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.push((key.trim().to_string(), value.trim().to_string()));
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(ProgrammerParams {
        name: name.to_string(),
        params,
    })
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &["sim"],
        description: "Simulated nRF24LE1 in memory, starts erased (max_read_len=<n>)",
        requires_root: false,
    });

    #[cfg(feature = "linux-gpio")]
    programmers.push(ProgrammerInfo {
        name: "linux_gpio",
        aliases: &["linux-gpio", "gpio"],
        description: "Linux GPIO bitbang (dev=/dev/gpiochipN,prog=,reset=,fcsn=,sck=,mosi=,miso=,spispeed=<kHz>)",
        requires_root: true,
    });

    programmers
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Resolve a name or alias to the canonical programmer name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Open the programmer described by `descriptor`
pub fn open_programmer(descriptor: &str) -> Result<Box<dyn Programmer>, Box<dyn std::error::Error>> {
    let params = parse_programmer_params(descriptor)?;

    let Some(name) = find_programmer(&params.name) else {
        return Err(format!(
            "Unknown programmer: {} (available: {})",
            params.name,
            programmer_names_short()
        )
        .into());
    };

    log::debug!("Opening programmer {} with {:?}", name, params.params);

    match name {
        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(&params),

        #[cfg(feature = "linux-gpio")]
        "linux_gpio" => nrfprog_linux_gpio::open_linux_gpio(&params.options()),

        _ => Err(format!("Programmer {} is not supported in this build", name).into()),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(params: &ProgrammerParams) -> Result<Box<dyn Programmer>, Box<dyn std::error::Error>> {
    use nrfprog_dummy::{DummyConfig, DummyNrf};

    let mut config = DummyConfig::default();
    for (key, value) in &params.params {
        match key.as_str() {
            "max_read_len" => {
                config.max_read_len = value
                    .parse()
                    .map_err(|_| format!("Invalid max_read_len value: {}", value))?;
            }
            _ => log::warn!("dummy: Unknown option: {}={}", key, value),
        }
    }

    Ok(Box::new(DummyNrf::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_only() {
        let params = parse_programmer_params("dummy").unwrap();
        assert_eq!(params.name, "dummy");
        assert!(params.params.is_empty());
    }

    #[test]
    fn test_parse_keeps_option_order() {
        let params = parse_programmer_params("linux_gpio:gpiochip=0,prog=24,reset=23").unwrap();
        assert_eq!(params.name, "linux_gpio");
        assert_eq!(
            params.options(),
            vec![("gpiochip", "0"), ("prog", "24"), ("reset", "23")]
        );
    }

    #[test]
    fn test_parse_rejects_malformed_option() {
        assert!(parse_programmer_params("linux_gpio:prog").is_err());
        assert!(parse_programmer_params(":prog=1").is_err());
    }

    #[test]
    fn test_unknown_programmer() {
        assert!(open_programmer("ch341a").is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy_by_alias() {
        assert_eq!(find_programmer("sim"), Some("dummy"));
        assert!(open_programmer("sim:max_read_len=16").is_ok());
        assert!(open_programmer("dummy:max_read_len=x").is_err());
    }
}
