pub mod client;
pub mod runtime;

use log::{ info, warn };
use nvml_wrapper::Nvml;
use std::fmt;
use std::str::FromStr;

/// Fixed sampling parameters for every generation call.
#[derive(Clone, Debug)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub stop: Vec<String>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            max_tokens: 2048,
            stop: vec!["<|im_end|>".to_string()],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineTier {
    Low,
    Medium,
    High,
}

impl fmt::Display for EngineTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineTier::Low => write!(f, "low"),
            EngineTier::Medium => write!(f, "medium"),
            EngineTier::High => write!(f, "high"),
        }
    }
}

impl FromStr for EngineTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(EngineTier::Low),
            "medium" => Ok(EngineTier::Medium),
            "high" => Ok(EngineTier::High),
            other => Err(format!("Invalid engine tier: '{}'", other)),
        }
    }
}

/// Runtime configuration selected once at startup from the available
/// accelerator memory.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub tier: EngineTier,
    pub quantization: Option<&'static str>,
    pub dtype: &'static str,
    pub max_model_len: u32,
    pub gpu_memory_utilization: f32,
}

const LOW_TIER_LIMIT_GB: f64 = 12.0;
const MEDIUM_TIER_LIMIT_GB: f64 = 24.0;

impl EngineConfig {
    pub fn for_tier(tier: EngineTier) -> Self {
        match tier {
            EngineTier::Low => Self {
                tier,
                quantization: Some("awq"),
                dtype: "auto",
                max_model_len: 4096,
                gpu_memory_utilization: 0.8,
            },
            EngineTier::Medium => Self {
                tier,
                quantization: None,
                dtype: "half",
                max_model_len: 8192,
                gpu_memory_utilization: 0.85,
            },
            EngineTier::High => Self {
                tier,
                quantization: None,
                dtype: "auto",
                max_model_len: 32768,
                gpu_memory_utilization: 0.9,
            },
        }
    }

    pub fn tier_for_memory_gb(total_gb: f64) -> EngineTier {
        if total_gb < LOW_TIER_LIMIT_GB {
            EngineTier::Low
        } else if total_gb < MEDIUM_TIER_LIMIT_GB {
            EngineTier::Medium
        } else {
            EngineTier::High
        }
    }

    /// Probes accelerator memory once and picks a tier. The serving runtime
    /// is out of process, so a failed probe only degrades the tier choice.
    pub fn detect(override_tier: Option<EngineTier>) -> Self {
        if let Some(tier) = override_tier {
            info!("Engine tier forced to '{}' by configuration", tier);
            return Self::for_tier(tier);
        }

        match probe_accelerator_memory_gb() {
            Some(total_gb) => {
                let tier = Self::tier_for_memory_gb(total_gb);
                info!("Accelerator memory detected: {:.1}GB, selecting '{}' tier", total_gb, tier);
                Self::for_tier(tier)
            }
            None => {
                warn!("Accelerator memory probe failed, falling back to 'low' tier");
                Self::for_tier(EngineTier::Low)
            }
        }
    }
}

fn probe_accelerator_memory_gb() -> Option<f64> {
    let nvml = Nvml::init().ok()?;
    let device = nvml.device_by_index(0).ok()?;
    let memory = device.memory_info().ok()?;
    Some(memory.total as f64 / 1e9)
}
