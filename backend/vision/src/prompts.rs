//! Fixed instructions sent with every image.

use finsight_core::{AnalysisProfile, AnalysisPrompt, PromptPurpose};

pub const REPORT_PROMPT: AnalysisPrompt = AnalysisPrompt {
    purpose: PromptPurpose::Report,
    text: "You are an expert marine biologist. Look at this image carefully.\n\
\n\
If there is a fish, or anything that looks like a fish, you must always name the most likely \
species. Never refuse and never answer that you are unsure: if you cannot tell for certain, \
make your best guess. Format the answer in markdown using exactly these sections:\n\
\n\
# <Species Name>\n\
## Characteristics\n\
(appearance, size, coloring, distinguishing features)\n\
## Habitat\n\
(where it lives, water type, geographic range)\n\
## Interesting Facts\n\
(two to four short bullet points)\n\
\n\
If there is no fish-like subject at all, reply only with:\n\
\n\
# Image Description\n\
(two or three sentences describing what the image shows)",
    max_tokens: 1000,
};

pub const SPOKEN_SUMMARY_PROMPT: AnalysisPrompt = AnalysisPrompt {
    purpose: PromptPurpose::SpokenSummary,
    text: "Give only the name of the fish in this image followed by a very brief description, \
in one or two plain sentences and under 30 words. This text will be read aloud, so do not use \
markdown, lists, or emoji. If you are unsure, give your best guess. If there is no fish, briefly \
say what the image shows instead.",
    max_tokens: 150,
};

pub const QUICK_CHECK_PROMPT: AnalysisPrompt = AnalysisPrompt {
    purpose: PromptPurpose::QuickCheck,
    text: "Is there a fish in this image? If yes, please identify the specific type of fish and \
provide a detailed description including its characteristics, habitat, and interesting facts. \
If no fish is present, simply respond with 'No fish detected in this image.'",
    max_tokens: 500,
};

const ENHANCED: [AnalysisPrompt; 2] = [REPORT_PROMPT, SPOKEN_SUMMARY_PROMPT];
const SIMPLE: [AnalysisPrompt; 1] = [QUICK_CHECK_PROMPT];

/// Prompts issued for one cycle, in call order.
pub fn prompts_for(profile: AnalysisProfile) -> &'static [AnalysisPrompt] {
    match profile {
        AnalysisProfile::Simple => &SIMPLE,
        AnalysisProfile::Enhanced => &ENHANCED,
    }
}
