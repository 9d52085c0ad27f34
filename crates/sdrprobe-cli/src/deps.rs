//! Runtime dependency check, run before any device access.

use sdrprobe_sim::hal::{DeviceUri, DriverRegistry};

/// Runtime capabilities the run needs but cannot find.
///
/// An unknown driver is not a missing dependency; discovery reports it.
pub fn check_dependencies(registry: &DriverRegistry, uri: &DeviceUri) -> Vec<String> {
    let mut missing = Vec::new();

    if let Some(driver) = registry.get(&uri.driver) {
        if !driver.is_available() {
            missing.push(format!("{} driver runtime library", driver.name()));
        }
    }

    for name in &missing {
        tracing::debug!("Missing dependency: {}", name);
    }
    missing
}
