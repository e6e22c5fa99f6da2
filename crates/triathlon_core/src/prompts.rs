//! crates/triathlon_core/src/prompts.rs
//!
//! Instructions sent to the model. Everything here is a pure function of the
//! athlete request, so the same request always renders the same text.

use crate::domain::AthleteRequest;
use crate::generator::Phase;

const SYSTEM_INSTRUCTIONS: &str = r#"You are an expert triathlon coach with 20+ years of experience training athletes for Sprint, Olympic, Half Ironman, and Full Ironman distances.

Your role is to create structured, periodized training programs that include:
- Swim, bike, and run workouts
- Specific intervals with duration/distance and intensity zones
- Proper warmup and cooldown protocols
- Progressive overload and recovery weeks
- Periodization across base, build, peak, and taper phases

Key principles:
1. Intensity Zones. Use these standard zones:
   - Zone 1: Recovery (very easy, conversational)
   - Zone 2: Aerobic/Endurance (comfortable, still conversational)
   - Zone 3: Tempo (moderately hard, some breathing effort)
   - Zone 4: Threshold (hard, sustained effort)
   - Zone 5: VO2 Max (very hard, short intervals)

2. Periodization. Structure programs in phases:
   - Base Phase (60-70% of total time): Build aerobic base, Zone 2 focus
   - Build Phase (20-30%): Add intensity, Zone 3-4 work
   - Peak Phase (5-10%): Race-specific intensity
   - Taper Phase (1-2 weeks): Reduce volume, maintain intensity

3. Weekly Structure. Balance stress and recovery:
   - Hard days followed by easy/recovery days
   - Long endurance sessions on weekends
   - Brick workouts (bike-to-run transitions)
   - At least 1 full rest day per week

4. Progression. Increase volume by 10-15% per week max, with recovery weeks every 3-4 weeks.

You must respond with valid JSON matching the TrainingProgram schema."#;

const PROGRAM_FORMAT: &str = r#"
Generate a complete training program in JSON format. Be CONCISE in descriptions.

Required JSON Format:
```json
{
  "goal": "race_distance",
  "fitness_level": "level",
  "duration_weeks": number,
  "weeks": [
    {
      "week_number": 1,
      "focus": "Base Building",
      "workouts": [
        {
          "sport": "swim|bike|run",
          "title": "Workout Title",
          "total_duration_minutes": 60,
          "total_distance_km": 5.0,
          "warmup": "10 min easy",
          "main_set": [
            {
              "duration_minutes": 20,
              "distance_km": 2.0,
              "intensity": "Zone 2",
              "description": "Aerobic swim"
            }
          ],
          "cooldown": "5 min easy",
          "notes": "Technique focus"
        }
      ],
      "weekly_volume_hours": 6.5,
      "weekly_distance_km": 50.0
    }
  ],
  "notes": "Program overview"
}
```

Guidelines:
1. Create 5-6 workouts per week based on available hours
2. Include all three sports distributed appropriately
3. Keep descriptions brief (5-10 words max)
4. Include one brick workout per week (bike followed by run)
5. Progressive volume with recovery weeks every 3-4 weeks
6. Return ONLY valid JSON, no markdown or extra text
"#;

const WEEK_FORMAT: &str = r#"
Return a JSON object with this structure (be CONCISE in descriptions):
```json
{
  "week_number": {week_number},
  "focus": "{phase} Training",
  "workouts": [
    {
      "sport": "swim|bike|run",
      "title": "Brief title",
      "total_duration_minutes": 60,
      "total_distance_km": 5.0,
      "warmup": "Brief description",
      "main_set": [
        {
          "duration_minutes": 30,
          "distance_km": 3.0,
          "intensity": "Zone 2",
          "description": "Brief description"
        }
      ],
      "cooldown": "Brief description",
      "notes": "Brief notes"
    }
  ],
  "weekly_volume_hours": 6.5,
  "weekly_distance_km": 45.0
}
```

Create 5-6 workouts. Include swim, bike, run. Keep descriptions under 10 words. Return ONLY valid JSON.
"#;

/// The coaching knowledge shared by every call.
pub fn system_prompt() -> &'static str {
    SYSTEM_INSTRUCTIONS
}

/// Asks for a whole program in one reply.
pub fn program_prompt(request: &AthleteRequest) -> String {
    let mut prompt = format!(
        "Create a {}-week training program for the following athlete:\n\n\
         Goal: {}\n\
         Fitness Level: {}\n\
         Available Training Time: {} hours per week\n\
         Current Week: Week {}\n",
        request.duration_weeks(),
        request.goal().description(),
        request.fitness_level(),
        request.available_hours_per_week(),
        request.current_week(),
    );

    if !request.focus_areas().is_empty() {
        prompt.push_str(&format!("Focus Areas: {}\n", request.focus_areas().join(", ")));
    }

    prompt.push_str(PROGRAM_FORMAT);
    prompt
}

/// Asks for one week of a longer program, scoped to its periodization phase.
pub fn week_prompt(request: &AthleteRequest, week_number: u32, phase: Phase) -> String {
    let mut prompt = format!(
        "Create Week {week_number} of a {}-week {} training program.\n\n\
         Phase: {phase}\n\
         Fitness Level: {}\n\
         Available Hours: {} hours/week\n",
        request.duration_weeks(),
        request.goal().description(),
        request.fitness_level(),
        request.available_hours_per_week(),
    );

    if !request.focus_areas().is_empty() {
        prompt.push_str(&format!("Focus Areas: {}\n", request.focus_areas().join(", ")));
    }

    prompt.push_str(
        &WEEK_FORMAT
            .replace("{week_number}", &week_number.to_string())
            .replace("{phase}", &phase.to_string()),
    );
    prompt
}
