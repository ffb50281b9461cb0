use std::fmt::{self, Display};

const RULE_WIDTH: usize = 80;

/// The outcome of one refinement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RefinementReport {
    pub(crate) initial_prompt: String,
    pub(crate) critiques: Vec<String>,
    pub(crate) final_prompt: String,
}

impl RefinementReport {
    /// Returns the prompt written by the generator.
    #[inline]
    pub fn initial_prompt(&self) -> &str {
        &self.initial_prompt
    }

    /// Returns the raw critic responses, one per successful iteration.
    #[inline]
    pub fn critiques(&self) -> &[String] {
        &self.critiques
    }

    /// Returns the prompt the refinement settled on.
    #[inline]
    pub fn final_prompt(&self) -> &str {
        &self.final_prompt
    }
}

impl Display for RefinementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f)?;
        write_heading(f, &rule, "INITIAL GENERATED PROMPT:")?;
        writeln!(f, "{}", self.initial_prompt)?;
        writeln!(f)?;
        write_heading(f, &rule, "PROMPT CRITIC'S FEEDBACK:")?;
        writeln!(f, "{}", self.critiques.join("\n"))?;
        writeln!(f)?;
        write_heading(f, &rule, "FINAL APPROVED PROMPT:")?;
        writeln!(f, "{}", self.final_prompt)?;
        writeln!(f, "{rule}")
    }
}

fn write_heading(
    f: &mut fmt::Formatter<'_>,
    rule: &str,
    title: &str,
) -> fmt::Result {
    writeln!(f, "{rule}")?;
    writeln!(f, "{title}")?;
    writeln!(f, "{rule}")
}
