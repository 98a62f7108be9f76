//! Output scaffold and the layout shell.

/// Layout every page extends, relative to the output root.
pub const LAYOUT_PATH: &str = "layout/base.html";

/// Top-level output directories.
pub const SCAFFOLD_DIRS: [&str; 4] = ["layout", "pages", "partials", "assets"];

/// Merge hook names in order, dropping duplicates and names that are not
/// usable as block identifiers.
pub fn merge_hooks<'a>(sources: impl IntoIterator<Item = &'a [String]>) -> Vec<String> {
    let mut hooks: Vec<String> = Vec::new();
    for name in sources.into_iter().flatten() {
        let name: String = name
            .trim()
            .chars()
            .map(|c| if c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();
        let usable = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if usable && !hooks.contains(&name) {
            hooks.push(name);
        }
    }
    hooks
}

/// The default layout: a content block plus one block per hook.
pub fn layout_shell(hooks: &[String]) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta content=\"width=device-width, initial-scale=1\" name=\"viewport\">\n\
         <title>{% block title %}{% endblock %}</title>\n\
         {% block head %}{% endblock %}\n\
         </head>\n\
         <body>\n\
         {% block content %}{% endblock %}\n",
    );
    for hook in hooks {
        out.push_str(&format!("{{% block hook_{hook} %}}{{% endblock %}}\n"));
    }
    out.push_str("</body>\n</html>\n");
    out
}
