//! Device selection for inference
//!
//! Preference parsing plus best-effort device acquisition. Selection never
//! fails: an unavailable accelerator falls back to CPU with a warning, so a
//! bad flag degrades performance rather than startup.

use anyhow::Result;
use candle_core::Device;
use serde::{Deserialize, Serialize};

/// Device preference for inference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevicePreference {
    Cuda,
    Metal,
    Cpu,
    #[default]
    Auto,
}

impl std::str::FromStr for DevicePreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cuda" | "gpu" => Ok(Self::Cuda),
            "metal" => Ok(Self::Metal),
            "cpu" => Ok(Self::Cpu),
            "auto" => Ok(Self::Auto),
            other => Err(anyhow::anyhow!(
                "Unknown device '{}' (expected cuda, metal, cpu, or auto)",
                other
            )),
        }
    }
}

impl std::fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Cuda => "cuda",
            Self::Metal => "metal",
            Self::Cpu => "cpu",
            Self::Auto => "auto",
        };
        f.write_str(name)
    }
}

fn try_cuda() -> Option<Device> {
    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => return Some(device),
            Err(e) => tracing::warn!("✗ CUDA init failed: {}", e),
        }
    }
    None
}

fn try_metal() -> Option<Device> {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => return Some(device),
            Err(e) => tracing::warn!("✗ Metal init failed: {}", e),
        }
    }
    None
}

/// Acquire a device honoring `preference`
///
/// Accelerators that are missing, broken, or not compiled in fall back to
/// CPU; the call itself never fails.
pub fn select_device(preference: DevicePreference) -> Result<Device> {
    let device = match preference {
        DevicePreference::Cpu => Device::Cpu,
        DevicePreference::Cuda => try_cuda().unwrap_or_else(|| {
            if cfg!(feature = "cuda") {
                tracing::warn!("No usable CUDA device, falling back to CPU");
            } else {
                tracing::warn!("CUDA requested but this build lacks the cuda feature, falling back to CPU");
            }
            Device::Cpu
        }),
        DevicePreference::Metal => try_metal().unwrap_or_else(|| {
            if cfg!(feature = "metal") {
                tracing::warn!("No usable Metal device, falling back to CPU");
            } else {
                tracing::warn!("Metal requested but this build lacks the metal feature, falling back to CPU");
            }
            Device::Cpu
        }),
        DevicePreference::Auto => try_cuda().or_else(try_metal).unwrap_or(Device::Cpu),
    };

    tracing::info!("✓ {} device selected", device_label(&device));
    Ok(device)
}

/// Short label for a device, suitable for status reporting
pub fn device_label(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_preference_from_str() {
        assert_eq!(
            "cuda".parse::<DevicePreference>().unwrap(),
            DevicePreference::Cuda
        );
        assert_eq!(
            "CPU".parse::<DevicePreference>().unwrap(),
            DevicePreference::Cpu
        );
        assert!("tpu".parse::<DevicePreference>().is_err());
    }

    #[test]
    fn test_cpu_always_available() {
        let device = select_device(DevicePreference::Cpu);
        assert!(device.is_ok());
        assert_eq!(device_label(&device.unwrap()), "cpu");
    }

    #[test]
    fn test_auto_without_accelerators_selects_cpu() {
        let device = select_device(DevicePreference::Auto).unwrap();
        if !cfg!(any(feature = "cuda", feature = "metal")) {
            assert_eq!(device_label(&device), "cpu");
        }
    }
}
