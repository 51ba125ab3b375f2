//! Link activation handling.
//!
//! Only plain primary clicks on in-app links are taken over by the router.
//! Everything else (external schemes, modified clicks, fragment jumps) keeps
//! its default behaviour.

/// Which mouse button activated a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    /// Usually the left button
    #[default]
    Primary,
    /// Usually the wheel button
    Auxiliary,
    /// Usually the right button
    Secondary,
}

/// Modifier keys held during activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Whether any modifier is held.
    pub fn any(&self) -> bool {
        self.ctrl || self.meta || self.shift || self.alt
    }
}

/// A link activation event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkClick {
    /// The anchor's `href`, if it has one
    pub href: Option<String>,
    /// Button used
    pub button: MouseButton,
    /// Modifier keys held
    pub modifiers: Modifiers,
}

impl LinkClick {
    /// A plain primary click on `href`.
    pub fn primary(href: impl Into<String>) -> Self {
        Self { href: Some(href.into()), ..Self::default() }
    }

    /// Same click with modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Same click with another button.
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// The in-app target of this click, or `None` for default handling.
    pub fn router_target(&self) -> Option<&str> {
        if self.button != MouseButton::Primary || self.modifiers.any() {
            return None;
        }
        let href = self.href.as_deref()?.trim();
        if href.is_empty() || href.starts_with('#') || is_external_href(href) {
            return None;
        }
        Some(href)
    }
}

/// What happened to a link activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDisposition {
    /// Default navigation suppressed; the router navigated instead
    Intercepted,
    /// Left to the host's default handling
    Default,
}

/// Whether `href` leaves the app: it has a URI scheme (`https:`,
/// `mailto:`, `tel:`, ...) or is protocol-relative (`//host/path`).
pub fn is_external_href(href: &str) -> bool {
    if href.starts_with("//") {
        return true;
    }
    let Some(colon) = href.find(':') else {
        return false;
    };
    let scheme = &href[..colon];
    if scheme.contains(['/', '?', '#']) {
        return false;
    }
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Resolve a relative reference against the current path.
///
/// Absolute paths pass through. Other references are joined to the
/// directory of `current` with `.` and `..` segments collapsed.
pub fn resolve_href(current: &str, href: &str) -> String {
    if href.starts_with('/') {
        return href.to_string();
    }

    let base = match current.rfind('/') {
        Some(idx) => &current[..=idx],
        None => "/",
    };
    let joined = format!("{base}{href}");

    let mut segments: Vec<&str> = Vec::new();
    let parts: Vec<&str> = joined.split('/').collect();
    let last = parts.len().saturating_sub(1);
    for (i, part) in parts.iter().enumerate() {
        match *part {
            "." => {}
            ".." => {
                segments.pop();
            }
            "" if i != last => {}
            other => segments.push(other),
        }
    }

    let mut resolved = format!("/{}", segments.join("/"));
    if (href.ends_with("/.") || href.ends_with("/..") || href == "." || href == "..")
        && !resolved.ends_with('/')
    {
        resolved.push('/');
    }
    resolved
}
