use tempvoice_common::MemberId;

/// Discord rejects channel names longer than this many characters.
pub const MAX_CHANNEL_NAME_CHARS: usize = 100;

/// Render a personal room name from `template`, substituting `{name}` with
/// the member's display name. Blank display names fall back to the member id.
pub fn render_room_name(template: &str, display_name: &str, member: MemberId) -> String {
    let display_name = display_name.trim();
    let name = if display_name.is_empty() {
        member.to_string()
    } else {
        display_name.to_string()
    };

    let rendered = template.replace("{name}", &name);
    let rendered = rendered.trim();
    if rendered.is_empty() {
        return name.chars().take(MAX_CHANNEL_NAME_CHARS).collect();
    }
    rendered.chars().take(MAX_CHANNEL_NAME_CHARS).collect()
}
