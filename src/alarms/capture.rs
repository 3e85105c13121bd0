//! Metrics captured alongside an appeared alarm, so the event shows what the
//! plant was doing when the bit went up.

use crate::prelude::*;
use crate::register_map::Fields;

use serde_json::{json, Value as Json};

const SQRT_3: f64 = 1.732;

const MAINS_FAULT_BITS: [&str; 8] = [
    "abnormal",
    "overvoltage",
    "undervoltage",
    "overfrequency",
    "underfrequency",
    "loss_phase",
    "reverse_phase",
    "blackout",
];

pub fn capture(family: Family, fields: &Fields) -> Json {
    match family {
        Family::Hgm9520n => generator(fields),
        Family::Hgm9560 => ats(fields),
    }
}

/// auto, manual, test, stop, in that order of precedence.
pub fn mode(fields: &Fields) -> &'static str {
    let set = |name: &str| fields.get(name).and_then(Value::as_bool) == Some(true);

    if set("mode_auto") {
        "auto"
    } else if set("mode_manual") {
        "manual"
    } else if set("mode_test") {
        "test"
    } else if set("mode_stop") {
        "stop"
    } else {
        "unknown"
    }
}

// A reading that was not received is unknown, never 0.
fn reading(fields: &Fields, name: &str) -> Json {
    fields.get(name).map(|v| json!(v)).unwrap_or(Json::Null)
}

fn phase(fields: &Fields, line: &str) -> Json {
    match fields.get(line).and_then(Value::as_f64) {
        Some(v) => json!((v / SQRT_3).round()),
        None => Json::Null,
    }
}

fn mains_fault_detail(fields: &Fields) -> Json {
    match fields.get("alarm_reg_44").and_then(Value::as_i64) {
        Some(reg) => {
            let detail: serde_json::Map<String, Json> = MAINS_FAULT_BITS
                .iter()
                .enumerate()
                .map(|(bit, name)| (name.to_string(), json!(reg & (1 << bit) != 0)))
                .collect();
            Json::Object(detail)
        }
        None => json!({}),
    }
}

fn generator(f: &Fields) -> Json {
    let mains_normal = f.get("mains_normal").and_then(Value::as_bool) == Some(true);

    json!({
        "gen": {
            "uab": reading(f, "gen_uab"),
            "ubc": reading(f, "gen_ubc"),
            "uca": reading(f, "gen_uca"),
            "ua": phase(f, "gen_uab"),
            "ub": phase(f, "gen_ubc"),
            "uc": phase(f, "gen_uca"),
            "ia": reading(f, "current_a"),
            "ib": reading(f, "current_b"),
            "ic": reading(f, "current_c"),
            "freq": reading(f, "gen_freq"),
            "total_p": reading(f, "power_total"),
            "total_q": reading(f, "reactive_total"),
        },
        "mains": {
            "uab": reading(f, "mains_uab"),
            "ubc": reading(f, "mains_ubc"),
            "uca": reading(f, "mains_uca"),
            "ua": phase(f, "mains_uab"),
            "ub": phase(f, "mains_ubc"),
            "uc": phase(f, "mains_uca"),
            "freq": reading(f, "mains_freq"),
            "status": if mains_normal { 0 } else { 2 },
            "status_text": if mains_normal { "normal" } else { "abnormal" },
        },
        "battery_voltage": reading(f, "battery_volt"),
        "charger_voltage": reading(f, "charger_volt"),
        "oil_pressure": reading(f, "oil_pressure"),
        "coolant_temp": reading(f, "coolant_temp"),
        "fuel_level": reading(f, "fuel_level"),
        "engine_speed": reading(f, "engine_speed"),
        "gen_status": reading(f, "gen_status"),
        "gen_status_text": reading(f, "gen_status_text"),
        "mode": mode(f),
    })
}

fn ats(f: &Fields) -> Json {
    json!({
        "mains": {
            "uab": reading(f, "mains_uab"),
            "ubc": reading(f, "mains_ubc"),
            "uca": reading(f, "mains_uca"),
            "ua": reading(f, "mains_ua"),
            "ub": reading(f, "mains_ub"),
            "uc": reading(f, "mains_uc"),
            "ia": reading(f, "mains_ia"),
            "ib": reading(f, "mains_ib"),
            "ic": reading(f, "mains_ic"),
            "freq": reading(f, "mains_freq"),
            "total_p": reading(f, "mains_total_p"),
            "total_q": reading(f, "mains_total_q"),
        },
        "busbar": {
            "uab": reading(f, "busbar_uab"),
            "ubc": reading(f, "busbar_ubc"),
            "uca": reading(f, "busbar_uca"),
            "ua": reading(f, "busbar_ua"),
            "ub": reading(f, "busbar_ub"),
            "uc": reading(f, "busbar_uc"),
            "freq": reading(f, "busbar_freq"),
            "current": reading(f, "busbar_current"),
            "total_p": reading(f, "busbar_p"),
            "total_q": reading(f, "busbar_q"),
        },
        "switches": {
            "busbar_switch": reading(f, "busbar_switch"),
            "busbar_switch_text": reading(f, "busbar_switch_text"),
            "mains_switch": reading(f, "mains_switch"),
            "mains_switch_text": reading(f, "mains_switch_text"),
            "mains_status": reading(f, "mains_status"),
            "mains_status_text": reading(f, "mains_status_text"),
        },
        "genset_status": reading(f, "genset_status"),
        "genset_status_text": reading(f, "genset_status_text"),
        "battery_voltage": reading(f, "battery_v"),
        "mode": mode(f),
        "mains_fault_detail": mains_fault_detail(f),
    })
}
