use std::fmt::{self, Display};

use prompt_refiner_core::{Error, RefinementEvent};

/// A human readable status line for a [`RefinementEvent`].
#[derive(Clone, Copy, Debug)]
pub struct StatusLine<'a>(pub &'a RefinementEvent);

impl StatusLine<'_> {
    /// Returns `true` if the line reports something the user should notice.
    #[inline]
    pub fn is_warning(&self) -> bool {
        matches!(
            self.0,
            RefinementEvent::CritiqueMissing { .. }
                | RefinementEvent::RateLimited { .. }
        )
    }
}

impl Display for StatusLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            RefinementEvent::Generating => {
                write!(f, "Generating initial prompt...")
            }
            RefinementEvent::Generated => {
                write!(f, "Initial prompt generated. Getting critique...")
            }
            RefinementEvent::Critiquing {
                iteration,
                max_iterations,
            } => write!(
                f,
                "Iteration {iteration}/{max_iterations}: Getting critique..."
            ),
            RefinementEvent::Approved { iteration } => {
                write!(f, "Iteration {iteration}: Prompt approved by critic.")
            }
            RefinementEvent::NeedsImprovement { iteration } => write!(
                f,
                "Iteration {iteration}: Prompt needs improvement. \
                 Continuing to next iteration..."
            ),
            RefinementEvent::CritiqueMissing { iteration, reason } => write!(
                f,
                "Warning: No response from critic in iteration {iteration} \
                 ({reason})"
            ),
            RefinementEvent::RateLimited { delay } => write!(
                f,
                "Rate limit hit. Waiting {} seconds before retry...",
                delay.as_secs_f32()
            ),
        }
    }
}

/// The message shown when a refinement fails and no report can be
/// produced.
#[derive(Clone, Copy, Debug)]
pub struct FailureNotice<'a>(pub &'a Error);

impl Display for FailureNotice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Error occurred while generating prompt: {}", self.0)?;
        writeln!(f, "Please try again in 60 seconds if you hit the rate limit.")
    }
}
