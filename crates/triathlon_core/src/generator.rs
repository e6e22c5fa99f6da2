//! crates/triathlon_core/src/generator.rs
//!
//! Turns an athlete request into a validated training program by driving a
//! text-generation provider. Short programs are requested in one call; long
//! programs are requested one week at a time, phase by phase, so that each
//! reply stays well under the provider's output limit.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{AthleteRequest, RequestValidationError, TrainingProgram, WeekPlan};
use crate::extract::extract_json_object;
use crate::ports::{CompletionRequest, FinishReason, PortError, TextGenerationService};
use crate::prompts;
use crate::schema::{self, SchemaError, Strictness};

const PREVIEW_CHARS: usize = 800;

//=========================================================================================
// Errors
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Invalid request: {0}")]
    Request(#[from] RequestValidationError),

    #[error(
        "Model returned no content (finish_reason={finish_reason}). This can happen with \
         auth/deployment issues, content filtering, or unsupported parameters."
    )]
    Extraction { finish_reason: String },

    #[error(
        "Model hit token limit (finish_reason='length'). Received {received_chars} chars but \
         JSON may be incomplete. Try: 1) Reduce duration_weeks (currently {duration_weeks}), \
         2) Increase max output tokens (currently {max_output_tokens}), or 3) Use a model with \
         larger output capacity."
    )]
    Truncation {
        received_chars: usize,
        duration_weeks: u32,
        max_output_tokens: u32,
    },

    #[error("Model did not return a valid {target}: {reason}. First 800 chars: {preview:?}")]
    Schema {
        target: &'static str,
        reason: SchemaError,
        preview: String,
    },

    /// The weeks parsed individually but the assembled program is inconsistent.
    #[error("Assembled training program is inconsistent: {0}")]
    Assembly(SchemaError),

    #[error("Provider rejected the request parameters: {0}")]
    ProviderParameter(String),

    #[error("Provider call failed: {0}")]
    Provider(String),

    #[error("Week {week} ({phase} phase) failed: {source}")]
    Week {
        week: u32,
        phase: Phase,
        #[source]
        source: Box<GenerationError>,
    },
}

impl From<PortError> for GenerationError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::InvalidParameter(msg) => GenerationError::ProviderParameter(msg),
            other => GenerationError::Provider(other.to_string()),
        }
    }
}

//=========================================================================================
// Periodization
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Base,
    Build,
    Peak,
    Taper,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Base => "Base",
            Phase::Build => "Build",
            Phase::Peak => "Peak",
            Phase::Taper => "Taper",
        })
    }
}

/// Number of weeks in each phase of a program.
///
/// Base, build and peak take 60%, 25% and 10% (at least one week) rounded down;
/// taper takes what is left, which is zero weeks for 4 and 5 week programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhasePlan {
    pub base: u32,
    pub build: u32,
    pub peak: u32,
    pub taper: u32,
}

impl PhasePlan {
    pub fn for_weeks(total: u32) -> Self {
        let base = total * 60 / 100;
        let build = total * 25 / 100;
        let peak = (total * 10 / 100).max(1);
        let taper = total.saturating_sub(base + build + peak);
        Self {
            base,
            build,
            peak,
            taper,
        }
    }

    pub fn total(&self) -> u32 {
        self.base + self.build + self.peak + self.taper
    }

    /// Phases in program order, each paired with its length.
    pub fn phases(&self) -> [(Phase, u32); 4] {
        [
            (Phase::Base, self.base),
            (Phase::Build, self.build),
            (Phase::Peak, self.peak),
            (Phase::Taper, self.taper),
        ]
    }
}

//=========================================================================================
// Generation Profile
//=========================================================================================

/// Per-provider call settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationProfile {
    /// Output limit for a whole-program reply.
    pub program_max_tokens: u32,
    /// Output limit for a single-week reply.
    pub week_max_tokens: u32,
    pub temperature: Option<f32>,
    pub json_object: bool,
    /// Programs longer than this many weeks are generated week by week.
    /// `None` always uses a single call.
    pub progressive_above_weeks: Option<u32>,
    pub strictness: Strictness,
}

impl Default for GenerationProfile {
    fn default() -> Self {
        Self {
            program_max_tokens: 16_000,
            week_max_tokens: 3_000,
            temperature: None,
            json_object: true,
            progressive_above_weeks: Some(6),
            strictness: Strictness::Lenient,
        }
    }
}

//=========================================================================================
// Generator
//=========================================================================================

pub struct ProgramGenerator {
    provider: Arc<dyn TextGenerationService>,
    profile: GenerationProfile,
}

impl ProgramGenerator {
    pub fn new(provider: Arc<dyn TextGenerationService>, profile: GenerationProfile) -> Self {
        Self { provider, profile }
    }

    /// Generates the full program for `request`.
    pub async fn generate(&self, request: &AthleteRequest) -> Result<TrainingProgram, GenerationError> {
        let progressive = self
            .profile
            .progressive_above_weeks
            .is_some_and(|limit| request.duration_weeks() > limit);

        info!(
            provider = self.provider.provider_name(),
            goal = %request.goal(),
            weeks = request.duration_weeks(),
            progressive,
            "generating training program"
        );

        if progressive {
            self.generate_progressive(request).await
        } else {
            self.generate_single_shot(request).await
        }
    }

    /// Generates one week of `request`'s program within the given phase.
    pub async fn generate_week(
        &self,
        request: &AthleteRequest,
        week_number: u32,
        phase: Phase,
    ) -> Result<WeekPlan, GenerationError> {
        let user = prompts::week_prompt(request, week_number, phase);
        let content = self
            .request_json(user, self.profile.week_max_tokens, request.duration_weeks())
            .await?;
        schema::parse_week(&content, self.profile.strictness).map_err(|reason| GenerationError::Schema {
            target: "week plan",
            reason,
            preview: preview(&content),
        })
    }

    async fn generate_single_shot(&self, request: &AthleteRequest) -> Result<TrainingProgram, GenerationError> {
        let user = prompts::program_prompt(request);
        let content = self
            .request_json(user, self.profile.program_max_tokens, request.duration_weeks())
            .await?;
        schema::parse_program(&content, self.profile.strictness).map_err(|reason| GenerationError::Schema {
            target: "training program",
            reason,
            preview: preview(&content),
        })
    }

    async fn generate_progressive(&self, request: &AthleteRequest) -> Result<TrainingProgram, GenerationError> {
        let plan = PhasePlan::for_weeks(request.duration_weeks());
        let mut weeks = Vec::with_capacity(plan.total() as usize);
        let mut week_number = 1;

        for (phase, length) in plan.phases() {
            for _ in 0..length {
                info!(week = week_number, %phase, "generating week");
                let week = self
                    .generate_week(request, week_number, phase)
                    .await
                    .map_err(|source| GenerationError::Week {
                        week: week_number,
                        phase,
                        source: Box::new(source),
                    })?;
                weeks.push(week);
                week_number += 1;
            }
        }

        let program = TrainingProgram {
            goal: request.goal(),
            fitness_level: request.fitness_level(),
            duration_weeks: request.duration_weeks(),
            weeks,
            notes: format!(
                "{}-week {} program with {}w base, {}w build, {}w peak, {}w taper phases",
                request.duration_weeks(),
                request.goal(),
                plan.base,
                plan.build,
                plan.peak,
                plan.taper
            ),
        };

        if self.profile.strictness == Strictness::Strict {
            schema::check_program(&program).map_err(GenerationError::Assembly)?;
        }
        Ok(program)
    }

    /// One provider call, returning the extracted JSON text of the reply.
    async fn request_json(
        &self,
        user: String,
        max_output_tokens: u32,
        duration_weeks: u32,
    ) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            system: prompts::system_prompt().to_string(),
            user,
            max_output_tokens,
            temperature: self.profile.temperature,
            json_object: self.profile.json_object,
        };

        let completion = self.provider.complete(&request).await?;
        let content = extract_json_object(&completion.text);

        if completion.finish_reason == Some(FinishReason::Length) {
            warn!(chars = content.len(), max_output_tokens, "model reply was truncated");
            return Err(GenerationError::Truncation {
                received_chars: content.len(),
                duration_weeks,
                max_output_tokens,
            });
        }

        if content.is_empty() {
            return Err(GenerationError::Extraction {
                finish_reason: completion
                    .finish_reason
                    .map_or_else(|| "none".to_string(), |r| r.to_string()),
            });
        }

        Ok(content)
    }
}

fn preview(content: &str) -> String {
    content
        .chars()
        .take(PREVIEW_CHARS)
        .collect::<String>()
        .replace('\n', "\\n")
}
