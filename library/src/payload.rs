// The script injected into Slack's preload bundle. Once the window's DOM is
// ready it fetches our two stylesheets and appends each as a <style>
// element, which is enough to override Slack's own rules.

use url::Url;

const STYLESHEETS: [&str; 2] = ["typography.css", "section-util.css"];

/// Renders the injected script for a given CSS base URL. Pure; the caller
/// decides where the result goes.
pub fn build_payload(css_base_url: &Url) -> String {
    let base = css_base_url.as_str().trim_end_matches('/');
    format!(
        r#"document.addEventListener('DOMContentLoaded', async function() {{
    async function generateStyleElement(url) {{
      const res = await fetch(url);
      const css = await res.text();

      const styleEl = document.createElement('style');
      styleEl.innerHTML = css;
      return styleEl;
    }}

    document.head.appendChild(await generateStyleElement('{base}/{first}'));
    document.head.appendChild(await generateStyleElement('{base}/{second}'));
}});"#,
        first = STYLESHEETS[0],
        second = STYLESHEETS[1],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_both_stylesheets() {
        let payload = build_payload(&Url::parse("https://example.test/css").unwrap());
        assert!(payload.contains("'https://example.test/css/typography.css'"));
        assert!(payload.contains("'https://example.test/css/section-util.css'"));
        assert!(payload.contains("DOMContentLoaded"));
    }

    #[test]
    fn trailing_slash_does_not_double_up() {
        let payload = build_payload(&Url::parse("https://example.test/css/").unwrap());
        assert!(payload.contains("'https://example.test/css/typography.css'"));
        assert!(!payload.contains("css//"));
    }
}
