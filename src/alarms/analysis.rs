//! Root-cause analysis for appeared alarms: what the alarm means, which
//! captured readings back it up, the likely cause and what to check first.
//!
//! Rules work on the captured metrics (see [`capture`](super::capture)), so
//! a reading that was not received shows up as `?` in the evidence rather
//! than as a misleading zero.

use crate::alarms::AlarmDefinition;

use serde::Serialize;
use serde_json::Value as Json;

/// Phases below this are considered lost.
const LOST_PHASE_VOLTS: f64 = 50.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Analysis {
    pub description: String,
    pub danger: Option<&'static str>,
    pub evidence: Vec<String>,
    pub probable_cause: String,
    pub recommendation: &'static str,
}

struct Findings {
    evidence: Vec<String>,
    probable_cause: String,
    recommendation: &'static str,
}

struct Rule {
    description: &'static str,
    danger: &'static str,
    analyze: fn(&Json) -> Findings,
}

pub fn analyze(definition: &AlarmDefinition, metrics: &Json) -> Analysis {
    match rule(definition.code) {
        Some(rule) => {
            let findings = (rule.analyze)(metrics);
            Analysis {
                description: rule.description.to_string(),
                danger: Some(rule.danger),
                evidence: findings.evidence,
                probable_cause: findings.probable_cause,
                recommendation: findings.recommendation,
            }
        }
        None => Analysis {
            description: definition.name.to_string(),
            danger: None,
            evidence: Vec::new(),
            probable_cause: "no specific analysis for this alarm".to_string(),
            recommendation: "Consult the SmartGen documentation for this alarm code.",
        },
    }
}

fn rule(code: &str) -> Option<&'static Rule> {
    let rule = match code {
        // HGM9560
        "M002" => &MAINS_OVERVOLTAGE,
        "M003" => &MAINS_UNDERVOLTAGE,
        "M004" => &MAINS_OVERFREQUENCY,
        "M005" => &MAINS_UNDERFREQUENCY,
        "M006" => &MAINS_LOSS_PHASE,
        "M007" => &MAINS_REVERSE_PHASE,
        "M008" => &MAINS_BLACKOUT,
        "M_MT_30_8" | "M_MT_30_9" => &MAINS_OVERCURRENT,
        "M_WN_20_0" => &BATTERY_UNDERVOLTAGE,
        "M_WN_21_2" => &SYNC_FAILURE,
        // HGM9520N
        "G_SD_0_0" => &EMERGENCY_STOP,
        "G_SD_0_1" => &OVERSPEED,
        "G_SD_0_6" => &GEN_OVERVOLTAGE,
        "G_SD_0_7" => &GEN_UNDERVOLTAGE,
        "G_SD_0_8" => &CRANK_FAILURE,
        "G_SD_0_9" => &GEN_OVERCURRENT,
        "G_SD_0_10" => &CURRENT_IMBALANCE,
        "G_SD_0_12" => &REVERSE_POWER,
        "G_SD_0_14" => &LOSS_OF_EXCITATION,
        "G_SD_1_2" | "G_SD_1_13" => &LOW_OIL_PRESSURE,
        "G_SD_1_8" => &HIGH_ENGINE_TEMP,
        "G_SD_2_12" | "G_WN_2_12" => &CHARGING_FAILURE,
        _ => return None,
    };
    Some(rule)
}

// metrics access {{{
fn lookup<'a>(m: &'a Json, path: &[&str]) -> Option<&'a Json> {
    path.iter()
        .try_fold(m, |v, key| v.get(*key))
        .filter(|v| !v.is_null())
}

fn num(m: &Json, path: &[&str]) -> Option<f64> {
    lookup(m, path).and_then(Json::as_f64)
}

fn show(m: &Json, path: &[&str]) -> String {
    match lookup(m, path) {
        Some(Json::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => "?".to_string(),
    }
}

fn phases(m: &Json, section: &str, names: [&str; 3]) -> Option<[f64; 3]> {
    Some([
        num(m, &[section, names[0]])?,
        num(m, &[section, names[1]])?,
        num(m, &[section, names[2]])?,
    ])
}

fn phase_voltages(m: &Json, section: &str) -> String {
    format!(
        "UA={}V, UB={}V, UC={}V",
        show(m, &[section, "ua"]),
        show(m, &[section, "ub"]),
        show(m, &[section, "uc"])
    )
}

fn min_max(values: [f64; 3]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

fn phase_name(index: usize) -> &'static str {
    ["A", "B", "C"][index]
}
// }}}

// HGM9560 {{{
static MAINS_UNDERVOLTAGE: Rule = Rule {
    description: "Mains voltage dropped below the undervoltage setpoint.",
    danger: "Low voltage raises currents and overheats cables and equipment.",
    analyze: |m| Findings {
        evidence: vec![
            phase_voltages(m, "mains"),
            format!("mains frequency: {} Hz", show(m, &["mains", "freq"])),
        ],
        probable_cause: undervoltage_cause(m),
        recommendation: "Check the supply voltage from the utility, the feeder cable and its terminations.",
    },
};

fn undervoltage_cause(m: &Json) -> String {
    let Some(volts) = phases(m, "mains", ["ua", "ub", "uc"]) else {
        return "phase voltages unknown, cause not determined".to_string();
    };
    let (min, max) = min_max(volts);

    if max < 180.0 {
        "sag on all phases, the problem is on the utility side".to_string()
    } else if max - min > 20.0 {
        let lost = volts.iter().position(|v| *v == min).map_or("?", phase_name);
        format!(
            "phase imbalance, phase {} sags to {}V: loose contact or overload on that phase",
            lost, min
        )
    } else {
        format!(
            "even sag ({}-{}V): substation problem or overloaded transformer",
            min, max
        )
    }
}

static MAINS_OVERVOLTAGE: Rule = Rule {
    description: "Mains voltage exceeded the overvoltage setpoint.",
    danger: "Overvoltage can damage sensitive equipment, electronics and capacitors.",
    analyze: |m| Findings {
        evidence: vec![phase_voltages(m, "mains")],
        probable_cause: "high supply voltage from the utility or load shedding on the grid".to_string(),
        recommendation: "Measure the incoming voltage. If it persists, contact the utility.",
    },
};

static MAINS_OVERFREQUENCY: Rule = Rule {
    description: "Mains frequency exceeded the overfrequency setpoint.",
    danger: "High frequency overspeeds induction motors and upsets electronics.",
    analyze: |m| Findings {
        evidence: vec![format!("mains frequency: {} Hz", show(m, &["mains", "freq"]))],
        probable_cause: "unstable grid with excess generation".to_string(),
        recommendation: "Check the incoming frequency. If it recurs, consider frequency stabilisation.",
    },
};

static MAINS_UNDERFREQUENCY: Rule = Rule {
    description: "Mains frequency fell below the underfrequency setpoint.",
    danger: "Low frequency means an overloaded grid; motors slow down.",
    analyze: |m| Findings {
        evidence: vec![format!("mains frequency: {} Hz", show(m, &["mains", "freq"]))],
        probable_cause: "overloaded grid, generation shortfall".to_string(),
        recommendation: "Check the incoming frequency. For recurring dips, rely more on local generation.",
    },
};

static MAINS_LOSS_PHASE: Rule = Rule {
    description: "One or more mains phases are lost.",
    danger: "Three-phase loads running on two phases overheat and fail.",
    analyze: |m| Findings {
        evidence: vec![
            phase_voltages(m, "mains"),
            format!("lost phase: {}", lost_phases(m)),
        ],
        probable_cause: "broken phase conductor, blown fuse on one phase or a substation fault".to_string(),
        recommendation: "Check all three incoming phases, fuses and breakers immediately.",
    },
};

fn lost_phases(m: &Json) -> String {
    let Some(volts) = phases(m, "mains", ["ua", "ub", "uc"]) else {
        return "unknown".to_string();
    };
    let lost: Vec<&str> = volts
        .iter()
        .enumerate()
        .filter(|(_, v)| **v < LOST_PHASE_VOLTS)
        .map(|(i, _)| phase_name(i))
        .collect();

    if lost.is_empty() {
        format!("none below {}V", LOST_PHASE_VOLTS)
    } else {
        lost.join(", ")
    }
}

static MAINS_BLACKOUT: Rule = Rule {
    description: "Mains voltage is gone on all three phases.",
    danger: "External supply is lost; the load moves entirely to the generator.",
    analyze: |m| Findings {
        evidence: vec![
            phase_voltages(m, "mains"),
            format!("mains breaker: {}", show(m, &["switches", "mains_switch_text"])),
        ],
        probable_cause: "utility outage or substation fault".to_string(),
        recommendation: "Check for voltage at the building intake and the incoming breaker, then call the utility dispatcher.",
    },
};

static MAINS_REVERSE_PHASE: Rule = Rule {
    description: "Mains phase sequence is reversed.",
    danger: "Three-phase motors will run backwards; compressors and pumps get damaged.",
    analyze: |m| Findings {
        evidence: vec![format!(
            "UAB={}V, UBC={}V, UCA={}V",
            show(m, &["mains", "uab"]),
            show(m, &["mains", "ubc"]),
            show(m, &["mains", "uca"])
        )],
        probable_cause: "phases swapped when the cable was reconnected".to_string(),
        recommendation: "Check the phase connection at the intake. Do not close the mains breaker until fixed.",
    },
};

static MAINS_OVERCURRENT: Rule = Rule {
    description: "Mains current exceeded the overcurrent setpoint and the mains breaker tripped.",
    danger: "The mains feeder is overloaded; cables and equipment may overheat.",
    analyze: |m| Findings {
        evidence: vec![
            format!(
                "IA={}A, IB={}A, IC={}A",
                show(m, &["mains", "ia"]),
                show(m, &["mains", "ib"]),
                show(m, &["mains", "ic"])
            ),
            format!("mains P: {} kW", show(m, &["mains", "total_p"])),
        ],
        probable_cause: "too much load connected or a short circuit in the load".to_string(),
        recommendation: "Check load consumption and look for a short circuit on the consumer side.",
    },
};

static BATTERY_UNDERVOLTAGE: Rule = Rule {
    description: "Battery voltage is below the setpoint.",
    danger: "A flat battery leaves the controller without power and unable to start the generator.",
    analyze: |m| Findings {
        evidence: vec![format!("battery: {}V", show(m, &["battery_voltage"]))],
        probable_cause: "charger fault, aged battery or a long idle period without charging".to_string(),
        recommendation: "Check the charger and measure the battery. Replace the battery if needed.",
    },
};

static SYNC_FAILURE: Rule = Rule {
    description: "The generator failed to synchronise with the mains in time.",
    danger: "Closing onto the mains without synchronisation causes a severe current surge.",
    analyze: |m| {
        let df = difference(m, "freq");
        let du = difference(m, "uab");
        Findings {
            evidence: vec![
                format!(
                    "busbar F: {} Hz, mains F: {} Hz",
                    show(m, &["busbar", "freq"]),
                    show(m, &["mains", "freq"])
                ),
                format!(
                    "busbar U: {}V, mains U: {}V",
                    show(m, &["busbar", "uab"]),
                    show(m, &["mains", "uab"])
                ),
            ],
            probable_cause: sync_failure_cause(df, du),
            recommendation: "Check the governor and the AVR, and the synchronisation window setpoints.",
        }
    },
};

fn difference(m: &Json, reading: &str) -> Option<f64> {
    Some((num(m, &["busbar", reading])? - num(m, &["mains", reading])?).abs())
}

fn sync_failure_cause(df: Option<f64>, du: Option<f64>) -> String {
    let mut reasons = Vec::new();
    if let Some(df) = df.filter(|df| *df > 0.5) {
        reasons.push(format!("frequency difference {:.2} Hz, check the governor", df));
    }
    if let Some(du) = du.filter(|du| *du > 15.0) {
        reasons.push(format!("voltage difference {}V, check the AVR", du));
    }
    if reasons.is_empty() {
        reasons.push("phase angle did not match within the synchronisation timeout".to_string());
    }
    reasons.join("; ")
}
// }}}

// HGM9520N {{{
static EMERGENCY_STOP: Rule = Rule {
    description: "The emergency stop button was pressed.",
    danger: "The engine was stopped hard and will not start until released.",
    analyze: |_| Findings {
        evidence: Vec::new(),
        probable_cause: "emergency stop on the controller or a remote button was pressed".to_string(),
        recommendation: "Find out why it was pressed, release the button and reset the alarm.",
    },
};

static OVERSPEED: Rule = Rule {
    description: "Engine speed exceeded the overspeed setpoint.",
    danger: "A runaway engine can break apart mechanically.",
    analyze: |m| Findings {
        evidence: vec![format!("engine speed: {} rpm", show(m, &["engine_speed"]))],
        probable_cause: "governor fault, stuck fuel rack or sudden load rejection".to_string(),
        recommendation: "Do not restart before the governor, fuel system and actuator are checked.",
    },
};

static GEN_OVERVOLTAGE: Rule = Rule {
    description: "Generator voltage exceeded the overvoltage setpoint.",
    danger: "Overvoltage can damage the generator windings and connected equipment.",
    analyze: |m| Findings {
        evidence: vec![phase_voltages(m, "gen")],
        probable_cause: "AVR fault, overspeed or sudden load rejection".to_string(),
        recommendation: "Check the AVR, engine speed and load.",
    },
};

static GEN_UNDERVOLTAGE: Rule = Rule {
    description: "Generator voltage fell below the undervoltage setpoint.",
    danger: "Low voltage raises currents and overheats the load.",
    analyze: |m| {
        let mut evidence = vec![phase_voltages(m, "gen")];
        if let Some(volts) = phases(m, "gen", ["ua", "ub", "uc"]) {
            evidence.push(format!("lowest phase: {}V", min_max(volts).0));
        }
        Findings {
            evidence,
            probable_cause: "generator overload, AVR fault or excitation problem".to_string(),
            recommendation: "Check the load against the rating, the AVR and the exciter winding.",
        }
    },
};

static CRANK_FAILURE: Rule = Rule {
    description: "The engine did not start after the configured crank attempts.",
    danger: "The generator cannot take the load; there is no backup supply.",
    analyze: |m| Findings {
        evidence: vec![format!("battery: {}V", show(m, &["battery_voltage"]))],
        probable_cause: "no fuel, flat battery, starter fault, clogged fuel filter or air in the fuel system".to_string(),
        recommendation: "Check fuel level, battery voltage, the starter and the fuel filter.",
    },
};

static GEN_OVERCURRENT: Rule = Rule {
    description: "Generator current exceeded the overcurrent setpoint.",
    danger: "Overload can damage the windings and start a fire.",
    analyze: |m| Findings {
        evidence: vec![
            format!(
                "IA={}A, IB={}A, IC={}A",
                show(m, &["gen", "ia"]),
                show(m, &["gen", "ib"]),
                show(m, &["gen", "ic"])
            ),
            format!("generator P: {} kW", show(m, &["gen", "total_p"])),
        ],
        probable_cause: "overload, short circuit in the load or the starting current of a large motor".to_string(),
        recommendation: "Check load consumption and look for a short circuit.",
    },
};

static CURRENT_IMBALANCE: Rule = Rule {
    description: "Current difference between phases exceeded the imbalance setpoint.",
    danger: "Imbalance heats the stator windings.",
    analyze: |m| {
        let mut evidence = vec![format!(
            "IA={}A, IB={}A, IC={}A",
            show(m, &["gen", "ia"]),
            show(m, &["gen", "ib"]),
            show(m, &["gen", "ic"])
        )];
        if let Some(amps) = phases(m, "gen", ["ia", "ib", "ic"]) {
            let (min, max) = min_max(amps);
            evidence.push(format!("max spread: {:.1}A", max - min));
        }
        Findings {
            evidence,
            probable_cause: "uneven single-phase loads or an open phase in the load".to_string(),
            recommendation: "Redistribute single-phase loads and check the cables.",
        }
    },
};

static REVERSE_POWER: Rule = Rule {
    description: "The generator is drawing power instead of supplying it.",
    danger: "The engine is being motored, which damages a diesel.",
    analyze: |m| Findings {
        evidence: vec![format!(
            "generator P: {} kW (negative means consumption)",
            show(m, &["gen", "total_p"])
        )],
        probable_cause: "fuel starvation, governor problem or stuck fuel rack".to_string(),
        recommendation: "Check fuel level, the governor and the load sharing setpoints.",
    },
};

static LOSS_OF_EXCITATION: Rule = Rule {
    description: "The generator lost excitation.",
    danger: "The generator cannot hold voltage; the load may lose supply.",
    analyze: |m| Findings {
        evidence: vec![format!(
            "Q={} kvar, P={} kW",
            show(m, &["gen", "total_q"]),
            show(m, &["gen", "total_p"])
        )],
        probable_cause: "AVR fault, open exciter winding or cable, or a failed rotating rectifier".to_string(),
        recommendation: "Check the AVR, the exciter cables and winding, and the rotating rectifier.",
    },
};

static LOW_OIL_PRESSURE: Rule = Rule {
    description: "Engine oil pressure fell below the setpoint.",
    danger: "Running without lubrication scores the bearings and seizes the engine.",
    analyze: |m| Findings {
        evidence: vec![format!("oil pressure: {}", show(m, &["oil_pressure"]))],
        probable_cause: "low oil level, oil pump fault, clogged oil filter or a leak".to_string(),
        recommendation: "Check the oil level and look for leaks. Do not start with low oil.",
    },
};

static HIGH_ENGINE_TEMP: Rule = Rule {
    description: "Engine temperature exceeded the setpoint.",
    danger: "Overheating can seize and destroy the engine.",
    analyze: |m| Findings {
        evidence: vec![format!("coolant: {} C", show(m, &["coolant_temp"]))],
        probable_cause: "low coolant, thermostat fault, clogged radiator or generator overload".to_string(),
        recommendation: "Check coolant level, radiator, fan and thermostat. Let the engine cool before restarting.",
    },
};

static CHARGING_FAILURE: Rule = Rule {
    description: "Charging voltage is missing or low with the engine running.",
    danger: "Without charging the battery drains and the controller loses power.",
    analyze: |m| Findings {
        evidence: vec![
            format!("battery: {}V", show(m, &["battery_voltage"])),
            format!("charger: {}V", show(m, &["charger_voltage"])),
        ],
        probable_cause: "broken alternator belt, regulator fault or a loose battery terminal".to_string(),
        recommendation: "Check the alternator belt, battery terminals and the charge regulator.",
    },
};
// }}}
