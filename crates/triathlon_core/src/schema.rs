//! crates/triathlon_core/src/schema.rs
//!
//! Validates model output against the training program shape and builds the
//! domain entities from it. Errors name the offending field by its path, e.g.
//! `weeks[1].workouts[0].sport`.

use serde_json::{Map, Value};
use std::str::FromStr;

use crate::domain::{
    FitnessLevel, Interval, RaceDistance, Sport, TrainingProgram, WeekPlan, Workout,
};

/// How much cross-field consistency is demanded of model output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Field-level checks only. Models often return slightly inconsistent
    /// programs and these are still usable.
    #[default]
    Lenient,
    /// Also require `weeks.len() == duration_weeks`, contiguous week numbers
    /// starting at 1, and a duration or distance on every interval.
    Strict,
}

impl FromStr for Strictness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(Strictness::Lenient),
            "strict" => Ok(Strictness::Strict),
            other => Err(format!("'{other}' is not one of: lenient, strict")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid JSON: {0}")]
    Syntax(String),
    #[error("missing required field `{0}`")]
    Missing(String),
    #[error("field `{path}` must be {expected}")]
    WrongType { path: String, expected: &'static str },
    #[error("field `{path}` has invalid value {value:?}, expected one of: {allowed}")]
    InvalidVariant {
        path: String,
        value: String,
        allowed: String,
    },
    #[error("program declares {declared} weeks but contains {actual}")]
    WeekCount { declared: u32, actual: usize },
    #[error("week at position {index} has week_number {found}, expected {expected}")]
    WeekSequence {
        index: usize,
        expected: u32,
        found: u32,
    },
    #[error("interval `{0}` has neither duration_minutes nor distance_km")]
    EmptyInterval(String),
}

/// Parses and validates a complete program.
pub fn parse_program(text: &str, strictness: Strictness) -> Result<TrainingProgram, SchemaError> {
    let value: Value = serde_json::from_str(text).map_err(|e| SchemaError::Syntax(e.to_string()))?;
    let program = program_from_value(&value)?;
    if strictness == Strictness::Strict {
        check_program(&program)?;
    }
    Ok(program)
}

/// Parses and validates a single week, as returned in progressive generation.
pub fn parse_week(text: &str, strictness: Strictness) -> Result<WeekPlan, SchemaError> {
    let value: Value = serde_json::from_str(text).map_err(|e| SchemaError::Syntax(e.to_string()))?;
    let week = week_from_value(&value, "")?;
    if strictness == Strictness::Strict {
        check_intervals(&week, "")?;
    }
    Ok(week)
}

/// Cross-field checks applied in [`Strictness::Strict`].
pub fn check_program(program: &TrainingProgram) -> Result<(), SchemaError> {
    if program.weeks.len() != program.duration_weeks as usize {
        return Err(SchemaError::WeekCount {
            declared: program.duration_weeks,
            actual: program.weeks.len(),
        });
    }
    for (index, week) in program.weeks.iter().enumerate() {
        let expected = index as u32 + 1;
        if week.week_number != expected {
            return Err(SchemaError::WeekSequence {
                index,
                expected,
                found: week.week_number,
            });
        }
        check_intervals(week, &format!("weeks[{index}]."))?;
    }
    Ok(())
}

fn check_intervals(week: &WeekPlan, prefix: &str) -> Result<(), SchemaError> {
    for (w, workout) in week.workouts.iter().enumerate() {
        for (i, interval) in workout.main_set.iter().enumerate() {
            if interval.duration_minutes.is_none() && interval.distance_km.is_none() {
                return Err(SchemaError::EmptyInterval(format!(
                    "{prefix}workouts[{w}].main_set[{i}]"
                )));
            }
        }
    }
    Ok(())
}

//=========================================================================================
// Value Walkers
//=========================================================================================

/// A JSON object together with its path, for error reporting.
struct Obj<'a> {
    map: &'a Map<String, Value>,
    path: &'a str,
}

impl<'a> Obj<'a> {
    fn new(value: &'a Value, path: &'a str) -> Result<Self, SchemaError> {
        let map = value.as_object().ok_or_else(|| SchemaError::WrongType {
            path: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
            expected: "an object",
        })?;
        Ok(Self { map, path })
    }

    fn field_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    /// Present and non-null.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn required(&self, key: &str) -> Result<&'a Value, SchemaError> {
        self.get(key)
            .ok_or_else(|| SchemaError::Missing(self.field_path(key)))
    }

    fn string(&self, key: &str) -> Result<String, SchemaError> {
        self.required(key)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.wrong_type(key, "a string"))
    }

    fn opt_string(&self, key: &str) -> Result<Option<String>, SchemaError> {
        self.get(key)
            .map(|v| v.as_str().map(str::to_string).ok_or_else(|| self.wrong_type(key, "a string")))
            .transpose()
    }

    fn uint(&self, key: &str) -> Result<u32, SchemaError> {
        as_u32(self.required(key)?).ok_or_else(|| self.wrong_type(key, "a non-negative integer"))
    }

    fn opt_uint(&self, key: &str) -> Result<Option<u32>, SchemaError> {
        self.get(key)
            .map(|v| as_u32(v).ok_or_else(|| self.wrong_type(key, "a non-negative integer")))
            .transpose()
    }

    fn number(&self, key: &str) -> Result<f64, SchemaError> {
        self.required(key)?
            .as_f64()
            .ok_or_else(|| self.wrong_type(key, "a number"))
    }

    fn opt_number(&self, key: &str) -> Result<Option<f64>, SchemaError> {
        self.get(key)
            .map(|v| v.as_f64().ok_or_else(|| self.wrong_type(key, "a number")))
            .transpose()
    }

    fn label<T>(&self, key: &str, all: &[T]) -> Result<T, SchemaError>
    where
        T: FromStr + ToString + Copy,
    {
        let raw = self.string(key)?;
        raw.parse::<T>().map_err(|_| SchemaError::InvalidVariant {
            path: self.field_path(key),
            value: raw.clone(),
            allowed: all.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
        })
    }

    fn array(&self, key: &str) -> Result<&'a Vec<Value>, SchemaError> {
        self.required(key)?
            .as_array()
            .ok_or_else(|| self.wrong_type(key, "an array"))
    }

    fn wrong_type(&self, key: &str, expected: &'static str) -> SchemaError {
        SchemaError::WrongType {
            path: self.field_path(key),
            expected,
        }
    }
}

/// Integers, and floats with no fractional part (models sometimes write `60.0`).
fn as_u32(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64).then_some(f as u32)
}

fn program_from_value(value: &Value) -> Result<TrainingProgram, SchemaError> {
    let obj = Obj::new(value, "")?;
    let weeks = obj
        .array("weeks")?
        .iter()
        .enumerate()
        .map(|(i, w)| week_from_value(w, &format!("weeks[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TrainingProgram {
        goal: obj.label("goal", &RaceDistance::ALL)?,
        fitness_level: obj.label("fitness_level", &FitnessLevel::ALL)?,
        duration_weeks: obj.uint("duration_weeks")?,
        weeks,
        notes: obj.string("notes")?,
    })
}

fn week_from_value(value: &Value, path: &str) -> Result<WeekPlan, SchemaError> {
    let obj = Obj::new(value, path)?;
    let workouts = obj
        .array("workouts")?
        .iter()
        .enumerate()
        .map(|(i, w)| workout_from_value(w, &obj.field_path(&format!("workouts[{i}]"))))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(WeekPlan {
        week_number: obj.uint("week_number")?,
        focus: obj.string("focus")?,
        workouts,
        weekly_volume_hours: obj.number("weekly_volume_hours")?,
        weekly_distance_km: obj.number("weekly_distance_km")?,
    })
}

fn workout_from_value(value: &Value, path: &str) -> Result<Workout, SchemaError> {
    let obj = Obj::new(value, path)?;
    let main_set = obj
        .array("main_set")?
        .iter()
        .enumerate()
        .map(|(i, v)| interval_from_value(v, &obj.field_path(&format!("main_set[{i}]"))))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Workout {
        sport: obj.label("sport", &Sport::ALL)?,
        title: obj.string("title")?,
        total_duration_minutes: obj.uint("total_duration_minutes")?,
        total_distance_km: obj.opt_number("total_distance_km")?,
        warmup: obj.string("warmup")?,
        main_set,
        cooldown: obj.string("cooldown")?,
        notes: obj.opt_string("notes")?,
    })
}

fn interval_from_value(value: &Value, path: &str) -> Result<Interval, SchemaError> {
    let obj = Obj::new(value, path)?;
    Ok(Interval {
        duration_minutes: obj.opt_uint("duration_minutes")?,
        distance_km: obj.opt_number("distance_km")?,
        intensity: obj.string("intensity")?,
        description: obj.string("description")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn interval(duration: Option<u32>, distance: Option<f64>) -> Interval {
        Interval {
            duration_minutes: duration,
            distance_km: distance,
            intensity: "Zone 2".into(),
            description: "Steady aerobic".into(),
        }
    }

    fn week(number: u32) -> WeekPlan {
        WeekPlan {
            week_number: number,
            focus: "Base Building".into(),
            workouts: vec![
                Workout {
                    sport: Sport::Swim,
                    title: "Technique swim".into(),
                    total_duration_minutes: 45,
                    total_distance_km: Some(2.0),
                    warmup: "200m easy".into(),
                    main_set: vec![interval(Some(20), Some(1.2)), interval(None, Some(0.4))],
                    cooldown: "100m easy".into(),
                    notes: Some("Focus on catch".into()),
                },
                Workout {
                    sport: Sport::Run,
                    title: "Brick run".into(),
                    total_duration_minutes: 30,
                    total_distance_km: None,
                    warmup: "5 min jog".into(),
                    main_set: vec![interval(Some(20), None)],
                    cooldown: "5 min walk".into(),
                    notes: None,
                },
            ],
            weekly_volume_hours: 6.5,
            weekly_distance_km: 52.25,
        }
    }

    fn program(weeks: u32) -> TrainingProgram {
        TrainingProgram {
            goal: RaceDistance::HalfIronman,
            fitness_level: FitnessLevel::Advanced,
            duration_weeks: weeks,
            weeks: (1..=weeks).map(week).collect(),
            notes: "Build to a strong 70.3".into(),
        }
    }

    #[test]
    fn serialized_program_parses_back_equal() {
        let original = program(4);
        let text = serde_json::to_string(&original).unwrap();
        assert_eq!(parse_program(&text, Strictness::Lenient).unwrap(), original);
        assert_eq!(parse_program(&text, Strictness::Strict).unwrap(), original);
    }

    #[test]
    fn rejects_goal_outside_race_distances() {
        let mut value = serde_json::to_value(program(4)).unwrap();
        value["goal"] = json!("marathon");
        let err = parse_program(&value.to_string(), Strictness::Lenient).unwrap_err();
        match err {
            SchemaError::InvalidVariant { path, value, .. } => {
                assert_eq!(path, "goal");
                assert_eq!(value, "marathon");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn names_nested_missing_field() {
        let mut value = serde_json::to_value(program(4)).unwrap();
        value["weeks"][2]["workouts"][1]
            .as_object_mut()
            .unwrap()
            .remove("cooldown");
        let err = parse_program(&value.to_string(), Strictness::Lenient).unwrap_err();
        assert_eq!(err, SchemaError::Missing("weeks[2].workouts[1].cooldown".into()));
    }

    #[test]
    fn names_field_with_wrong_type() {
        let mut value = serde_json::to_value(program(4)).unwrap();
        value["weeks"][0]["weekly_volume_hours"] = json!("six");
        let err = parse_program(&value.to_string(), Strictness::Lenient).unwrap_err();
        assert_eq!(
            err,
            SchemaError::WrongType {
                path: "weeks[0].weekly_volume_hours".into(),
                expected: "a number"
            }
        );
    }

    #[test]
    fn invalid_sport_reports_its_path() {
        let mut value = serde_json::to_value(week(1)).unwrap();
        value["workouts"][0]["sport"] = json!("rowing");
        let err = parse_week(&value.to_string(), Strictness::Lenient).unwrap_err();
        assert!(err.to_string().contains("workouts[0].sport"), "{err}");
    }

    #[test]
    fn whole_floats_are_accepted_for_integer_fields() {
        let mut value = serde_json::to_value(week(3)).unwrap();
        value["week_number"] = json!(3.0);
        value["workouts"][0]["total_duration_minutes"] = json!(45.0);
        assert_eq!(parse_week(&value.to_string(), Strictness::Lenient).unwrap(), week(3));

        value["week_number"] = json!(3.5);
        assert!(matches!(
            parse_week(&value.to_string(), Strictness::Lenient),
            Err(SchemaError::WrongType { .. })
        ));
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(matches!(
            parse_program("{\"goal\": ", Strictness::Lenient),
            Err(SchemaError::Syntax(_))
        ));
        assert!(matches!(
            parse_program("", Strictness::Lenient),
            Err(SchemaError::Syntax(_))
        ));
    }

    #[test]
    fn lenient_mode_accepts_inconsistent_programs() {
        let mut p = program(4);
        p.duration_weeks = 6;
        p.weeks[1].week_number = 7;
        p.weeks[0].workouts[0].main_set.push(interval(None, None));
        let text = serde_json::to_string(&p).unwrap();
        assert_eq!(parse_program(&text, Strictness::Lenient).unwrap(), p);
    }

    #[test]
    fn strict_mode_checks_week_count_sequence_and_intervals() {
        let mut p = program(4);
        p.duration_weeks = 5;
        let text = serde_json::to_string(&p).unwrap();
        assert_eq!(
            parse_program(&text, Strictness::Strict).unwrap_err(),
            SchemaError::WeekCount { declared: 5, actual: 4 }
        );

        let mut p = program(4);
        p.weeks.swap(1, 2);
        let text = serde_json::to_string(&p).unwrap();
        assert_eq!(
            parse_program(&text, Strictness::Strict).unwrap_err(),
            SchemaError::WeekSequence { index: 1, expected: 2, found: 3 }
        );

        let mut w = week(1);
        w.workouts[1].main_set.push(interval(None, None));
        let text = serde_json::to_string(&w).unwrap();
        assert_eq!(
            parse_week(&text, Strictness::Strict).unwrap_err(),
            SchemaError::EmptyInterval("workouts[1].main_set[1]".into())
        );
    }

    #[test]
    fn strictness_parses_from_config_labels() {
        assert_eq!("STRICT".parse::<Strictness>().unwrap(), Strictness::Strict);
        assert_eq!("lenient".parse::<Strictness>().unwrap(), Strictness::Lenient);
        assert!("loose".parse::<Strictness>().is_err());
    }
}
