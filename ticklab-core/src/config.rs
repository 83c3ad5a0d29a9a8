//! Strategy and replay configuration, loadable from TOML.
//!
//! Every options struct has a `Default` carrying the stock values the
//! strategies run with, and a `validate()` that fails fast instead of
//! clamping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::algo::{AlgoError, SliceParams};
use crate::domain::{InstrumentError, InstrumentInfo, Side};
use crate::strategy::{ImbalanceStrategy, PairStrategy, Strategy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("slicing algorithm: {0}")]
    Algo(#[from] AlgoError),

    #[error(transparent)]
    Instrument(#[from] InstrumentError),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn require_positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive, got {v}")))
    }
}

fn require_non_negative(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be non-negative, got {v}")))
    }
}

fn require_code(field: &'static str, code: &str) -> Result<(), ConfigError> {
    if code.trim().is_empty() {
        Err(invalid(field, "instrument code is empty"))
    } else {
        Ok(())
    }
}

// ── Single-instrument imbalance strategy ──────────────────────────────

/// Options for [`ImbalanceStrategy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImbalanceOptions {
    pub instrument: String,
    /// Cancel outstanding orders older than this.
    pub expiry_secs: f64,
    /// Ticks added through the last price on entry.
    pub offset_ticks: f64,
    /// Minimum spacing between entries.
    pub quiet_secs: f64,
    pub order_qty: f64,
}

impl Default for ImbalanceOptions {
    fn default() -> Self {
        Self {
            instrument: String::new(),
            expiry_secs: 20.0,
            offset_ticks: 0.0,
            quiet_secs: 30.0,
            order_qty: 1.0,
        }
    }
}

impl ImbalanceOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_code("instrument", &self.instrument)?;
        require_non_negative("expiry_secs", self.expiry_secs)?;
        require_non_negative("offset_ticks", self.offset_ticks)?;
        require_non_negative("quiet_secs", self.quiet_secs)?;
        require_positive("order_qty", self.order_qty)
    }
}

// ── Pair strategy ─────────────────────────────────────────────────────

/// Options for [`PairStrategy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairOptions {
    /// Near-term leg, traded only to flatten pair exposure.
    pub hedge_leg: String,
    /// Leg carrying the scheduled entries and exits.
    pub primary_leg: String,
    pub expiry_secs: f64,
    /// Ticks through the last price for hedge orders.
    pub hedge_offset_ticks: f64,
    /// Target absolute position on the primary leg in ladder mode.
    pub bet_size: f64,
    pub primary: PrimaryLegMode,
}

impl Default for PairOptions {
    fn default() -> Self {
        Self {
            hedge_leg: String::new(),
            primary_leg: String::new(),
            expiry_secs: 20.0,
            hedge_offset_ticks: 20.0,
            bet_size: 10.0,
            primary: PrimaryLegMode::Ladder(LadderOptions::default()),
        }
    }
}

impl PairOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_code("hedge_leg", &self.hedge_leg)?;
        require_code("primary_leg", &self.primary_leg)?;
        if self.hedge_leg == self.primary_leg {
            return Err(invalid("primary_leg", "must differ from hedge_leg"));
        }
        require_non_negative("expiry_secs", self.expiry_secs)?;
        require_non_negative("hedge_offset_ticks", self.hedge_offset_ticks)?;
        require_positive("bet_size", self.bet_size)?;
        match &self.primary {
            PrimaryLegMode::Ladder(ladder) => ladder.validate(),
            PrimaryLegMode::Sliced(slice) => slice.validate(&self.primary_leg),
        }
    }
}

/// How the primary leg is worked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PrimaryLegMode {
    /// Minute-of-hour windows with a passive then aggressive repricing ladder.
    Ladder(LadderOptions),
    /// A scheduled slicing algorithm.
    Sliced(SliceOptions),
}

/// Minute-of-hour windows for the repricing ladder.
///
/// Entry: passive for `entry_start..=entry_end`, aggressive for
/// `entry_end < m < entry_deadline`. Exit: passive for `exit_start..=exit_end`,
/// aggressive for `m > exit_end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderOptions {
    /// Side of the entry; exits trade the opposite side.
    pub side: Side,
    pub entry_start: u32,
    pub entry_end: u32,
    pub entry_deadline: u32,
    pub exit_start: u32,
    pub exit_end: u32,
    /// Ticks inside the spread from the own-side touch.
    pub passive_offset_ticks: f64,
    /// Ticks through the far touch.
    pub aggressive_offset_ticks: f64,
}

impl Default for LadderOptions {
    fn default() -> Self {
        Self {
            side: Side::Sell,
            entry_start: 1,
            entry_end: 10,
            entry_deadline: 13,
            exit_start: 48,
            exit_end: 55,
            passive_offset_ticks: 1.0,
            aggressive_offset_ticks: 10.0,
        }
    }
}

impl LadderOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("passive_offset_ticks", self.passive_offset_ticks)?;
        require_non_negative("aggressive_offset_ticks", self.aggressive_offset_ticks)?;
        let ordered = self.entry_start <= self.entry_end
            && self.entry_end < self.entry_deadline
            && self.entry_deadline <= self.exit_start
            && self.exit_start <= self.exit_end
            && self.exit_end < 60;
        if !ordered {
            return Err(invalid(
                "ladder",
                format!(
                    "windows must satisfy entry_start <= entry_end < entry_deadline <= exit_start <= exit_end < 60, got {}/{}/{}/{}/{}",
                    self.entry_start, self.entry_end, self.entry_deadline, self.exit_start, self.exit_end
                ),
            ));
        }
        Ok(())
    }
}

/// Schedule and sizing for the slicing algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceOptions {
    /// Activation minute as `HH:MM`.
    pub activate_at: String,
    pub horizon_minutes: f64,
    pub total_slots: u32,
    pub slice_size: u32,
    pub side: Side,
    pub price_offset_ticks: f64,
    pub cooldown_secs: f64,
}

impl Default for SliceOptions {
    fn default() -> Self {
        Self {
            activate_at: "11:01".into(),
            horizon_minutes: 10.0,
            total_slots: 10,
            slice_size: 2,
            side: Side::Sell,
            price_offset_ticks: 100.0,
            cooldown_secs: 20.0,
        }
    }
}

impl SliceOptions {
    /// Parse `activate_at` into `(hour, minute)`.
    pub fn activation(&self) -> Result<(u32, u32), ConfigError> {
        let bad = || invalid("activate_at", format!("expected HH:MM, got {:?}", self.activate_at));
        let (h, m) = self.activate_at.split_once(':').ok_or_else(bad)?;
        let hour: u32 = h.trim().parse().map_err(|_| bad())?;
        let minute: u32 = m.trim().parse().map_err(|_| bad())?;
        if hour > 23 || minute > 59 {
            return Err(bad());
        }
        Ok((hour, minute))
    }

    pub fn to_params(&self, instrument: &str) -> SliceParams {
        SliceParams {
            instrument: instrument.to_string(),
            horizon_minutes: self.horizon_minutes,
            total_slots: self.total_slots,
            slice_size: self.slice_size,
            side: self.side,
            price_offset_ticks: self.price_offset_ticks,
            cooldown_secs: self.cooldown_secs,
        }
    }

    pub fn validate(&self, instrument: &str) -> Result<(), ConfigError> {
        self.activation()?;
        self.to_params(instrument).validate()?;
        Ok(())
    }
}

// ── Top-level ─────────────────────────────────────────────────────────

/// Which strategy to run, with its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    Imbalance(ImbalanceOptions),
    Pair(PairOptions),
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Imbalance(o) => o.validate(),
            Self::Pair(o) => o.validate(),
        }
    }

    /// Instrument codes the strategy trades.
    pub fn instruments(&self) -> Vec<&str> {
        match self {
            Self::Imbalance(o) => vec![o.instrument.as_str()],
            Self::Pair(o) => vec![o.hedge_leg.as_str(), o.primary_leg.as_str()],
        }
    }

    /// Validate and construct the strategy.
    pub fn build(&self, name: &str) -> Result<Box<dyn Strategy>, ConfigError> {
        Ok(match self {
            Self::Imbalance(o) => Box::new(ImbalanceStrategy::new(name, o.clone())?),
            Self::Pair(o) => Box::new(PairStrategy::new(name, o.clone())?),
        })
    }
}

/// Simulated venue behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueOptions {
    /// Probability in `[0, 1)` that a submission is rejected.
    pub reject_rate: f64,
    pub seed: u64,
    /// Starting signed positions by instrument.
    pub initial_positions: BTreeMap<String, f64>,
}

impl Default for VenueOptions {
    fn default() -> Self {
        Self {
            reject_rate: 0.0,
            seed: 42,
            initial_positions: BTreeMap::new(),
        }
    }
}

impl VenueOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.reject_rate) {
            return Err(invalid(
                "reject_rate",
                format!("must be in [0, 1), got {}", self.reject_rate),
            ));
        }
        Ok(())
    }
}

/// A full replay: strategy, instrument metadata and venue behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub strategy: StrategyConfig,
    pub instruments: Vec<InstrumentInfo>,
    #[serde(default)]
    pub venue: VenueOptions,
}

fn default_name() -> String {
    "ticklab".to_string()
}

impl ReplayConfig {
    /// Load a replay config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a replay config.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        self.venue.validate()?;
        for inst in &self.instruments {
            InstrumentInfo::new(inst.code.clone(), inst.tick_size)?;
        }
        for code in self.strategy.instruments() {
            if !self.instruments.iter().any(|i| i.code == code) {
                return Err(invalid(
                    "instruments",
                    format!("no [[instruments]] entry for {code}"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIR_SLICED: &str = r#"
name = "sp_pair"

[strategy]
type = "pair"
hedge_leg = "SHFE.sp.2201"
primary_leg = "SHFE.sp.2202"
expiry_secs = 20

[strategy.primary]
mode = "sliced"
activate_at = "11:01"
total_slots = 10
slice_size = 2
cooldown_secs = 20

[[instruments]]
code = "SHFE.sp.2201"
tick_size = 2.0

[[instruments]]
code = "SHFE.sp.2202"
tick_size = 2.0

[venue]
seed = 7
"#;

    #[test]
    fn parses_pair_with_sliced_primary() {
        let cfg = ReplayConfig::from_toml(PAIR_SLICED).unwrap();
        assert_eq!(cfg.name, "sp_pair");
        assert_eq!(cfg.venue.seed, 7);
        let StrategyConfig::Pair(pair) = &cfg.strategy else {
            panic!("expected pair strategy");
        };
        assert_eq!(pair.hedge_offset_ticks, 20.0);
        let PrimaryLegMode::Sliced(slice) = &pair.primary else {
            panic!("expected sliced primary");
        };
        assert_eq!(slice.activation().unwrap(), (11, 1));
        assert_eq!(slice.horizon_minutes, 10.0);
        assert_eq!(slice.side, Side::Sell);
    }

    #[test]
    fn parses_imbalance_with_defaults() {
        let toml = r#"
[strategy]
type = "imbalance"
instrument = "CFFEX.IF.HOT"
offset_ticks = 1

[[instruments]]
code = "CFFEX.IF.HOT"
tick_size = 0.2
"#;
        let cfg = ReplayConfig::from_toml(toml).unwrap();
        assert_eq!(cfg.name, "ticklab");
        match cfg.strategy {
            StrategyConfig::Imbalance(o) => {
                assert_eq!(o.expiry_secs, 20.0);
                assert_eq!(o.quiet_secs, 30.0);
                assert_eq!(o.offset_ticks, 1.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zero_slice_fails_fast() {
        let bad = PAIR_SLICED.replace("slice_size = 2", "slice_size = 0");
        let err = ReplayConfig::from_toml(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::Algo(AlgoError::ZeroSliceSize)));
    }

    #[test]
    fn missing_instrument_entry_is_rejected() {
        let bad = PAIR_SLICED.replace("code = \"SHFE.sp.2201\"", "code = \"SHFE.sp.2205\"");
        let err = ReplayConfig::from_toml(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "instruments", .. }));
    }

    #[test]
    fn bad_activation_time() {
        let mut slice = SliceOptions::default();
        slice.activate_at = "25:00".into();
        assert!(slice.activation().is_err());
        slice.activate_at = "1101".into();
        assert!(slice.activation().is_err());
    }

    #[test]
    fn ladder_windows_must_be_ordered() {
        let mut ladder = LadderOptions::default();
        assert!(ladder.validate().is_ok());
        ladder.entry_deadline = 5;
        assert!(ladder.validate().is_err());
    }
}
