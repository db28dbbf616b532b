//! UDQs used as user defined arguments (UDA) in well and group controls.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::UdqConfig;
use super::UdqError;

/// A control argument that may be given as a UDQ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UdaControl {
    WconprodOrat,
    WconprodWrat,
    WconprodGrat,
    WconprodLrat,
    WconprodResv,
    WconprodBhp,
    WconprodThp,
    WconinjeRate,
    WconinjeResv,
    WconinjeBhp,
    WconinjeThp,
    GconprodOilTarget,
    GconprodWaterTarget,
    GconprodGasTarget,
    GconprodLiquidTarget,
    GconinjeSurfaceMaxRate,
    GconinjeResvMaxRate,
    GconinjeTargetReinjFraction,
    GconinjeTargetVoidFraction,
    WeltargOrat,
    WeltargWrat,
    WeltargGrat,
    WeltargLrat,
    WeltargResv,
    WeltargBhp,
    WeltargThp,
    WeltargLift,
}

impl UdaControl {
    /// Restart code of the control.
    pub fn code(self) -> i32 {
        match self {
            UdaControl::WconprodOrat => 300_004,
            UdaControl::WconprodWrat => 400_004,
            UdaControl::WconprodGrat => 500_004,
            UdaControl::WconprodLrat => 600_004,
            UdaControl::WconprodResv => 700_004,
            UdaControl::WconprodBhp => 800_004,
            UdaControl::WconprodThp => 900_004,
            UdaControl::WconinjeRate => 400_003,
            UdaControl::WconinjeResv => 500_003,
            UdaControl::WconinjeBhp => 600_003,
            UdaControl::WconinjeThp => 700_003,
            UdaControl::GconprodOilTarget => 200_019,
            UdaControl::GconprodWaterTarget => 300_019,
            UdaControl::GconprodGasTarget => 400_019,
            UdaControl::GconprodLiquidTarget => 500_019,
            UdaControl::GconinjeSurfaceMaxRate => 300_017,
            UdaControl::GconinjeResvMaxRate => 400_017,
            UdaControl::GconinjeTargetReinjFraction => 500_017,
            UdaControl::GconinjeTargetVoidFraction => 600_017,
            UdaControl::WeltargOrat => 16,
            UdaControl::WeltargWrat => 100_016,
            UdaControl::WeltargGrat => 200_016,
            UdaControl::WeltargLrat => 300_016,
            UdaControl::WeltargResv => 400_016,
            UdaControl::WeltargBhp => 500_016,
            UdaControl::WeltargThp => 600_016,
            UdaControl::WeltargLift => 1_000_016,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        ALL_CONTROLS.iter().copied().find(|control| control.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            UdaControl::WconprodOrat => "WCONPROD_ORAT",
            UdaControl::WconprodWrat => "WCONPROD_WRAT",
            UdaControl::WconprodGrat => "WCONPROD_GRAT",
            UdaControl::WconprodLrat => "WCONPROD_LRAT",
            UdaControl::WconprodResv => "WCONPROD_RESV",
            UdaControl::WconprodBhp => "WCONPROD_BHP",
            UdaControl::WconprodThp => "WCONPROD_THP",
            UdaControl::WconinjeRate => "WCONINJE_RATE",
            UdaControl::WconinjeResv => "WCONINJE_RESV",
            UdaControl::WconinjeBhp => "WCONINJE_BHP",
            UdaControl::WconinjeThp => "WCONINJE_THP",
            UdaControl::GconprodOilTarget => "GCONPROD_ORAT",
            UdaControl::GconprodWaterTarget => "GCONPROD_WRAT",
            UdaControl::GconprodGasTarget => "GCONPROD_GRAT",
            UdaControl::GconprodLiquidTarget => "GCONPROD_LRAT",
            UdaControl::GconinjeSurfaceMaxRate => "GCONINJE_SURFACE_RATE",
            UdaControl::GconinjeResvMaxRate => "GCONINJE_RESV_RATE",
            UdaControl::GconinjeTargetReinjFraction => "GCONINJE_REINJ_FRACTION",
            UdaControl::GconinjeTargetVoidFraction => "GCONINJE_VOID_FRACTION",
            UdaControl::WeltargOrat => "WELTARG_ORAT",
            UdaControl::WeltargWrat => "WELTARG_WRAT",
            UdaControl::WeltargGrat => "WELTARG_GRAT",
            UdaControl::WeltargLrat => "WELTARG_LRAT",
            UdaControl::WeltargResv => "WELTARG_RESV",
            UdaControl::WeltargBhp => "WELTARG_BHP",
            UdaControl::WeltargThp => "WELTARG_THP",
            UdaControl::WeltargLift => "WELTARG_LIFT",
        }
    }

    /// The keyword carrying this control.
    pub fn keyword(self) -> &'static str {
        self.name().split('_').next().unwrap_or_default()
    }

    pub fn is_well_control(self) -> bool {
        self.keyword().starts_with('W')
    }

    pub fn is_group_control(self) -> bool {
        self.keyword().starts_with('G')
    }

    /// WCONPROD control for a rate/pressure mode mnemonic.
    pub fn wconprod(mode: &str) -> Option<Self> {
        Some(match mode {
            "ORAT" => UdaControl::WconprodOrat,
            "WRAT" => UdaControl::WconprodWrat,
            "GRAT" => UdaControl::WconprodGrat,
            "LRAT" => UdaControl::WconprodLrat,
            "RESV" => UdaControl::WconprodResv,
            "BHP" => UdaControl::WconprodBhp,
            "THP" => UdaControl::WconprodThp,
            _ => return None,
        })
    }
}

const ALL_CONTROLS: [UdaControl; 27] = [
    UdaControl::WconprodOrat,
    UdaControl::WconprodWrat,
    UdaControl::WconprodGrat,
    UdaControl::WconprodLrat,
    UdaControl::WconprodResv,
    UdaControl::WconprodBhp,
    UdaControl::WconprodThp,
    UdaControl::WconinjeRate,
    UdaControl::WconinjeResv,
    UdaControl::WconinjeBhp,
    UdaControl::WconinjeThp,
    UdaControl::GconprodOilTarget,
    UdaControl::GconprodWaterTarget,
    UdaControl::GconprodGasTarget,
    UdaControl::GconprodLiquidTarget,
    UdaControl::GconinjeSurfaceMaxRate,
    UdaControl::GconinjeResvMaxRate,
    UdaControl::GconinjeTargetReinjFraction,
    UdaControl::GconinjeTargetVoidFraction,
    UdaControl::WeltargOrat,
    UdaControl::WeltargWrat,
    UdaControl::WeltargGrat,
    UdaControl::WeltargLrat,
    UdaControl::WeltargResv,
    UdaControl::WeltargBhp,
    UdaControl::WeltargThp,
    UdaControl::WeltargLift,
];

impl fmt::Display for UdaControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A control argument: a number or the name of a UDQ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UdaValue {
    Number(f64),
    Udq(String),
}

impl UdaValue {
    /// Deck item: a number, otherwise a UDQ name.
    pub fn from_item(item: &str) -> Self {
        item.parse::<f64>()
            .map_or_else(|_| UdaValue::Udq(item.to_string()), UdaValue::Number)
    }

    pub fn is_udq(&self) -> bool {
        matches!(self, UdaValue::Udq(_))
    }

    pub fn number(&self) -> Option<f64> {
        match self {
            UdaValue::Number(value) => Some(*value),
            UdaValue::Udq(_) => None,
        }
    }
}

impl Default for UdaValue {
    fn default() -> Self {
        UdaValue::Number(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdqActiveInput {
    /// Input index of the UDQ in the [`UdqConfig`].
    pub input_index: usize,
    pub udq: String,
    pub wgname: String,
    pub control: UdaControl,
}

/// One restart row: a UDQ used for one control, with its use count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdqActiveOutput {
    pub udq: String,
    pub input_index: usize,
    pub wgname: String,
    pub control: UdaControl,
    pub uda_code: i32,
    pub use_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UdqActive {
    input: Vec<UdqActiveInput>,
}

impl UdqActive {
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn input(&self) -> &[UdqActiveInput] {
        &self.input
    }

    /// Record that `wgname`'s `control` is now given by `value`.
    ///
    /// Returns whether the set of active UDAs changed:
    /// a UDQ value for a new (entity, control) adds a row, a different UDQ
    /// replaces the row, the same UDQ changes nothing; a number removes an
    /// existing row or changes nothing. An unknown UDQ is an error.
    pub fn update(
        &mut self,
        config: &UdqConfig,
        value: &UdaValue,
        wgname: &str,
        control: UdaControl,
    ) -> Result<bool, UdqError> {
        let existing = self
            .input
            .iter()
            .position(|record| record.wgname == wgname && record.control == control);

        let UdaValue::Udq(udq) = value else {
            return Ok(match existing {
                Some(pos) => {
                    self.input.remove(pos);
                    true
                }
                None => false,
            });
        };

        let input_index = config
            .index(udq)
            .map(|index| index.insert_index)
            .ok_or_else(|| UdqError::UnknownUda {
                udq: udq.clone(),
                control: control.name(),
                wgname: wgname.to_string(),
            })?;

        match existing {
            Some(pos) if self.input[pos].udq == *udq => Ok(false),
            Some(pos) => {
                let record = &mut self.input[pos];
                record.udq.clone_from(udq);
                record.input_index = input_index;
                Ok(true)
            }
            None => {
                self.input.push(UdqActiveInput {
                    input_index,
                    udq: udq.clone(),
                    wgname: wgname.to_string(),
                    control,
                });
                Ok(true)
            }
        }
    }

    /// One row per distinct (UDQ, control), in first-use order.
    pub fn iuad(&self) -> Vec<UdqActiveOutput> {
        let mut output: Vec<UdqActiveOutput> = Vec::new();
        for record in &self.input {
            if let Some(row) = output
                .iter_mut()
                .find(|row| row.udq == record.udq && row.control == record.control)
            {
                row.use_count += 1;
                continue;
            }
            output.push(UdqActiveOutput {
                udq: record.udq.clone(),
                input_index: record.input_index,
                wgname: record.wgname.clone(),
                control: record.control,
                uda_code: record.control.code(),
                use_count: 1,
            });
        }
        output
    }

    /// Input rows regrouped so that users of the same (UDQ, control) are
    /// adjacent, following [`Self::iuad`] order.
    pub fn iuap(&self) -> Vec<UdqActiveInput> {
        self.iuad()
            .iter()
            .flat_map(|row| {
                self.input
                    .iter()
                    .filter(move |record| record.input_index == row.input_index && record.control == row.control)
                    .cloned()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::udq::UdqParams;

    fn config() -> UdqConfig {
        let mut config = UdqConfig::new(UdqParams::default());
        config.add_assign("WUOPRL", &[], 100.0, 0).unwrap();
        config.add_assign("WULPRL", &[], 200.0, 0).unwrap();
        config
    }

    #[test]
    fn control_codes_and_names() {
        assert_eq!(UdaControl::WconprodOrat.code(), 300_004);
        assert_eq!(UdaControl::from_code(1_000_016), Some(UdaControl::WeltargLift));
        assert_eq!(UdaControl::GconinjeSurfaceMaxRate.keyword(), "GCONINJE");
        assert!(UdaControl::WeltargBhp.is_well_control());
        assert!(UdaControl::GconprodOilTarget.is_group_control());
        assert_eq!(UdaControl::wconprod("LRAT"), Some(UdaControl::WconprodLrat));
    }

    #[test]
    fn update_outcomes() {
        let config = config();
        let mut active = UdqActive::default();
        let orat = UdaControl::WconprodOrat;
        let udq = |name: &str| UdaValue::Udq(name.to_string());

        assert!(active.update(&config, &udq("WUOPRL"), "P1", orat).unwrap());
        assert!(!active.update(&config, &udq("WUOPRL"), "P1", orat).unwrap());
        assert!(active.update(&config, &udq("WULPRL"), "P1", orat).unwrap());
        assert_eq!(active.input()[0].input_index, 1);
        assert!(active.update(&config, &UdaValue::Number(10.0), "P1", orat).unwrap());
        assert!(!active.update(&config, &UdaValue::Number(10.0), "P1", orat).unwrap());
        assert!(active.is_empty());
        assert!(matches!(
            active.update(&config, &udq("WUNKNOWN"), "P1", orat),
            Err(UdqError::UnknownUda { .. })
        ));
    }

    #[test]
    fn iuad_counts_uses_and_iuap_groups_them() {
        let config = config();
        let mut active = UdqActive::default();
        let orat = UdaControl::WconprodOrat;
        let lrat = UdaControl::WconprodLrat;
        let udq = |name: &str| UdaValue::Udq(name.to_string());
        active.update(&config, &udq("WUOPRL"), "P1", orat).unwrap();
        active.update(&config, &udq("WULPRL"), "P1", lrat).unwrap();
        active.update(&config, &udq("WUOPRL"), "P2", orat).unwrap();

        let iuad = active.iuad();
        assert_eq!(iuad.len(), 2);
        assert_eq!(iuad[0].use_count, 2);
        assert_eq!(iuad[0].uda_code, 300_004);
        assert_eq!(iuad[1].use_count, 1);

        let iuap = active.iuap();
        let wells: Vec<&str> = iuap.iter().map(|r| r.wgname.as_str()).collect();
        assert_eq!(wells, ["P1", "P2", "P1"]);
    }
}
