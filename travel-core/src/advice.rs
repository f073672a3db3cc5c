use std::collections::BTreeMap;

use crate::model::{Advice, DaySummary, Packing, PollutantAlert, round1};

/// A "Good" air-quality ceiling for one pollutant, in µg/m³.
#[derive(Debug, Clone, Copy)]
pub struct GoodThreshold {
    pub pollutant: &'static str,
    pub good_max: f64,
    pub risk: &'static str,
}

/// Alert order follows this table, not the order of the input map.
pub const GOOD_THRESHOLDS: &[GoodThreshold] = &[
    GoodThreshold {
        pollutant: "PM25",
        good_max: 12.0,
        risk: "Fine particles reach deep into the lungs; consider a mask for long outdoor stays.",
    },
    GoodThreshold {
        pollutant: "PM10",
        good_max: 54.0,
        risk: "Coarse dust can irritate eyes and airways.",
    },
    GoodThreshold {
        pollutant: "NO2",
        good_max: 53.0,
        risk: "Traffic pollution may aggravate asthma near busy roads.",
    },
    GoodThreshold {
        pollutant: "SO2",
        good_max: 35.0,
        risk: "Sulphur dioxide can trigger breathing difficulty in sensitive groups.",
    },
    GoodThreshold {
        pollutant: "O3",
        good_max: 70.0,
        risk: "Ozone peaks in the afternoon; plan strenuous activity for the morning.",
    },
    GoodThreshold {
        pollutant: "CO",
        good_max: 4400.0,
        risk: "Carbon monoxide reduces oxygen delivery; avoid enclosed traffic areas.",
    },
];

const COLD_BELOW_C: f64 = 8.0;
const HOT_ABOVE_C: f64 = 24.0;

/// `pm2_5` -> `PM25`.
pub fn canonical_pollutant(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Map a mean temperature onto a packing band.
pub fn packing_band(mean_c: Option<f64>) -> Packing {
    match mean_c {
        None => Packing::Unknown,
        Some(t) if t < COLD_BELOW_C => Packing::Cold,
        Some(t) if t > HOT_ABOVE_C => Packing::Hot,
        Some(_) => Packing::Mild,
    }
}

/// The band is taken from the exact mean; only the reported mean is rounded.
pub fn packing_advice(days: &[DaySummary]) -> Advice {
    let temps: Vec<f64> = days.iter().filter_map(|d| d.temp_avg_c).collect();
    let mean = (!temps.is_empty()).then(|| temps.iter().sum::<f64>() / temps.len() as f64);

    Advice {
        umbrella: days.iter().any(|d| d.rain_mm > 0.0),
        packing: packing_band(mean),
        mean_temp_c: mean.map(round1),
    }
}

/// Alerts for every pollutant strictly above its "Good" ceiling.
pub fn pollution_alerts(components: &BTreeMap<String, f64>) -> Vec<PollutantAlert> {
    let canonical: BTreeMap<String, f64> =
        components.iter().fold(BTreeMap::new(), |mut acc, (name, value)| {
            acc.entry(canonical_pollutant(name))
                .and_modify(|v: &mut f64| *v = v.max(*value))
                .or_insert(*value);
            acc
        });

    GOOD_THRESHOLDS
        .iter()
        .filter_map(|t| {
            let value = *canonical.get(t.pollutant)?;
            (value > t.good_max).then(|| PollutantAlert {
                pollutant: t.pollutant.to_string(),
                value,
                good_max: t.good_max,
                elevation: round1(value - t.good_max),
                percent_of_good: (value / t.good_max * 100.0).round() as i64,
                risk: t.risk.to_string(),
            })
        })
        .collect()
}

/// Per-day variant of [`pollution_alerts`] over each day's maximum concentrations.
pub fn air_alerts(per_day_max: &[BTreeMap<String, f64>]) -> Vec<Vec<PollutantAlert>> {
    per_day_max.iter().map(pollution_alerts).collect()
}
