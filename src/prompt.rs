use crate::encoder::EncodedImageReference;

/// Few-shot template steering the model towards the four-field test case layout.
/// `{screenshots}` and `{text}` are filled in by [`build_prompt`].
pub const TESTING_GUIDE_TEMPLATE: &str = "Here are examples of test case descriptions:\n\n\
1. *Test Case 1*: Check login functionality.\n   \
- *Pre-conditions*: User must have an active account.\n   \
- *Testing Steps*: Open the app, enter username and password, click login.\n   \
- *Expected Result*: User is directed to the dashboard.\n\n\
2. *Test Case 2*: Verify 'Forgot Password' functionality.\n   \
- *Pre-conditions*: User must have a registered email.\n   \
- *Testing Steps*: Click on 'Forgot Password', enter email, check inbox.\n   \
- *Expected Result*: User receives a password reset link.\n\n\
Based on these examples and the following step-by-step screenshots:\n\n\
{screenshots}\n\n\
And the provided context:\n\n\
{text}\n\n\
Create a detailed, step-by-step guide for testing each functionality described in the screenshots. For each test case, include:\n\n\
1. *Description*: What the test case is about.\n\
2. *Pre-conditions*: What needs to be set up or ensured before testing.\n\
3. *Testing Steps*: Clear, step-by-step instructions on how to perform the test.\n\
4. *Expected Result*: What should happen if the feature works correctly.\n\nGuide:";

pub fn build_prompt(context: Option<&str>, images: &[EncodedImageReference]) -> String {
    let screenshots = images
        .iter()
        .map(|r| r.reference.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    render(
        TESTING_GUIDE_TEMPLATE,
        &[("screenshots", &screenshots), ("text", context.unwrap_or_default())],
    )
}

// Single left-to-right pass; substituted values are never rescanned.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = tail.find('}').and_then(|close| {
            let name = &tail[..close];
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v, close))
        });
        match hit {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
