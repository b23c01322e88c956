//! Prompt sent alongside the screenshot.

/// Build the instruction text for `task_description`.
#[must_use]
pub fn build_prompt(task_description: &str) -> String {
    let task = match task_description.trim() {
        "" => "No task provided",
        t => t,
    };

    format!(
        "You monitor whether a computer user's screen activity matches the task they claim to be \
         working on.\n\n\
         The task they provided is: \"{task}\".\n\
         Carefully inspect the screenshot and respond with a **single JSON object** containing:\n  \
         \"summary\": A concise 1-2 sentence description + advice.\n  \
         \"alignment\": Either \"on_task\" if they appear to be working on the task or \"off_task\" \
         if they look distracted/unsure.\n"
    )
}
