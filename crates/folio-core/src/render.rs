//! Config renderer.
//!
//! Builds the HTML for each fixed page region from a `SiteConfig`. Every call
//! rebuilds every region from scratch; there is no diffing against previous
//! output. Config text is always escaped.

use tracing::debug;

use crate::site::{LinkValue, SiteConfig, TextOrList};
use crate::utils::{capitalize, escape_html};

/// GitHub mark shown on project cards.
const GITHUB_ICON_PATH: &str = "M8 0C3.58 0 0 3.58 0 8c0 3.54 2.29 6.53 5.47 7.59.4.07.55-.17.55-.38 0-.19-.01-.82-.01-1.49-2.01.37-2.53-.49-2.69-.94-.09-.23-.48-.94-.82-1.13-.28-.15-.68-.52-.01-.53.63-.01 1.08.58 1.23.82.72 1.21 1.87.87 2.33.66.07-.52.28-.87.51-1.07-1.78-.2-3.64-.89-3.64-3.95 0-.87.31-1.59.82-2.15-.08-.2-.36-1.02.08-2.12 0 0 .67-.21 2.2.82.64-.18 1.32-.27 2-.27.68 0 1.36.09 2 .27 1.53-1.04 2.2-.82 2.2-.82.44 1.1.16 1.92.08 2.12.51.56.82 1.27.82 2.15 0 3.07-1.87 3.75-3.65 3.95.29.25.54.73.54 1.48 0 1.07-.01 1.93-.01 2.2 0 .21.15.46.55.38A8.012 8.012 0 0 0 16 8c0-4.42-3.58-8-8-8z";

/// Page script handlers wired to the hero buttons. `js/app.js` defines them.
const RESUME_TOGGLE_HANDLER: &str = "toggleResumeDropdown()";
const SLIDER_OPEN_HANDLER: &str = "openImageSlider(); return false;";

/// Separator between contact links.
const CONTACT_SEPARATOR: &str = " · ";

/// Page shell used when no template is supplied. Regions are `{{name}}` markers.
pub const DEFAULT_SHELL: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{title}}</title>
  <meta name="description" content="{{description}}">
  <link rel="stylesheet" href="css/style.css">
</head>
<body>
  <header class="brand"><img src="assets/images/stoked-logo.png" alt="logo"></header>
  <main>
    <section class="hero">
      <img class="profile-pic" src="assets/images/devreno.jpg" alt="profile picture">
      <h1 id="name">{{name}}</h1>
      <p id="role">{{role}}</p>
      <div id="summary">{{summary}}</div>
      <div id="hero-links">{{hero_links}}</div>
      <div id="tags">{{tags}}</div>
    </section>
    <section><h2>Projects</h2><div id="projects">{{projects}}</div></section>
    <section><h2>Experience</h2><div id="experience">{{experience}}</div></section>
    <section><h2>Certifications</h2><div id="certifications">{{certifications}}</div></section>
    <section><h2>Contact</h2><p id="contact-links">{{contact}}</p></section>
  </main>
  <div id="click-egg" class="hidden"></div>
  <div id="konami-egg" class="hidden"></div>
  <div id="secret-commands" class="hidden"></div>
  <div id="image-slider" class="hidden"></div>
  <script src="js/app.js"></script>
</body>
</html>
"#;

/// HTML for every region of the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    pub name: String,
    pub role: String,
    pub summary: String,
    pub hero_links: String,
    pub tags: String,
    pub projects: String,
    pub experience: String,
    /// None when the config has no certifications section; the region is then
    /// left empty.
    pub certifications: Option<String>,
    pub contact: String,
    pub title: String,
    pub description: String,
}

impl RenderedPage {
    fn regions(&self) -> [(&'static str, &str); 11] {
        [
            ("name", self.name.as_str()),
            ("role", self.role.as_str()),
            ("summary", self.summary.as_str()),
            ("hero_links", self.hero_links.as_str()),
            ("tags", self.tags.as_str()),
            ("projects", self.projects.as_str()),
            ("experience", self.experience.as_str()),
            ("certifications", self.certifications.as_deref().unwrap_or("")),
            ("contact", self.contact.as_str()),
            ("title", self.title.as_str()),
            ("description", self.description.as_str()),
        ]
    }

    fn region(&self, name: &str) -> Option<&str> {
        self.regions()
            .into_iter()
            .find(|(region, _)| *region == name)
            .map(|(_, html)| html)
    }

    /// Replace every `{{region}}` marker in a page shell.
    ///
    /// The template is scanned once; substituted HTML is never scanned again,
    /// so marker-like text inside config values is left as written. Unknown
    /// markers are kept.
    pub fn fill(&self, template: &str) -> String {
        let mut page = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("{{") {
            page.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let filled = after
                .find("}}")
                .and_then(|end| self.region(&after[..end]).map(|html| (end, html)));
            match filled {
                Some((end, html)) => {
                    page.push_str(html);
                    rest = &after[end + 2..];
                }
                None => {
                    page.push_str("{{");
                    rest = after;
                }
            }
        }
        page.push_str(rest);
        page
    }
}

fn external_link(href: &str, class: Option<&str>, label: &str) -> String {
    let class = class
        .map(|c| format!(r#" class="{}""#, c))
        .unwrap_or_default();
    format!(
        r#"<a{class} href="{}" target="_blank" rel="noopener">{}</a>"#,
        escape_html(href),
        escape_html(label)
    )
}

fn text_or_list(value: &TextOrList, paragraph: bool) -> String {
    match value {
        TextOrList::List(items) => {
            let items: String = items
                .iter()
                .map(|item| format!("<li>{}</li>", escape_html(item)))
                .collect();
            format!("<ul>{items}</ul>")
        }
        TextOrList::Text(text) if paragraph => format!("<p>{}</p>", escape_html(text)),
        TextOrList::Text(text) => escape_html(text),
    }
}

fn render_resume_link(resume: Option<&LinkValue>) -> String {
    match resume {
        Some(LinkValue::Formats(formats)) if formats.pdf.is_some() && formats.docx.is_some() => {
            let pdf = formats.pdf.as_deref().unwrap_or_default();
            let docx = formats.docx.as_deref().unwrap_or_default();
            format!(
                concat!(
                    r#"<div class="resume-dropdown">"#,
                    r#"<button class="btn ghost resume-btn" aria-controls="resume-dropdown" onclick="{}">Resume</button>"#,
                    r#"<div class="resume-dropdown-content" id="resume-dropdown">"#,
                    "{}{}</div></div>"
                ),
                RESUME_TOGGLE_HANDLER,
                external_link(pdf, None, "PDF"),
                external_link(docx, None, "DOCX"),
            )
        }
        Some(value) => external_link(value.primary_url().unwrap_or("#"), Some("btn ghost"), "Resume"),
        None => String::new(),
    }
}

fn render_hero_links(cfg: &SiteConfig) -> String {
    let mut html = format!(
        r##"<a class="btn ghost" href="#image-slider" onclick="{SLIDER_OPEN_HANDLER}">Images</a>"##
    );
    for (key, label) in [("linkedin", "LinkedIn"), ("github", "GitHub")] {
        if let Some(url) = cfg.links.url(key) {
            html.push_str(&external_link(url, Some("btn ghost"), label));
        }
    }
    html.push_str(&render_resume_link(cfg.links.get("resume")));
    html
}

fn render_tags(cfg: &SiteConfig) -> String {
    cfg.keywords
        .iter()
        .map(|k| external_link(cfg.keyword_link(k), Some("tag"), k))
        .collect()
}

fn render_projects(cfg: &SiteConfig) -> String {
    cfg.projects
        .iter()
        .map(|p| {
            let badges: String = p
                .stack
                .iter()
                .map(|s| format!(r#"<span class="badge">{}</span>"#, escape_html(s)))
                .collect();
            let demo = p
                .links
                .demo
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(|d| external_link(d, Some("demo-link"), "Demo"))
                .unwrap_or_default();
            format!(
                concat!(
                    r#"<article class="card"><h3>{title}</h3><p>{description}</p>"#,
                    r#"<div class="badges">{badges}</div>"#,
                    r#"<div class="card-footer">{demo}"#,
                    r#"<a href="{repo}" target="_blank" rel="noopener" class="github-icon" aria-label="View {title} source code on GitHub">"#,
                    r#"<svg width="32" height="32" fill="currentColor" viewBox="0 0 16 16" aria-hidden="true"><path d="{icon}"/></svg>"#,
                    "</a></div></article>"
                ),
                title = escape_html(&p.title),
                description = escape_html(&p.description),
                badges = badges,
                demo = demo,
                repo = escape_html(&p.links.repo),
                icon = GITHUB_ICON_PATH,
            )
        })
        .collect()
}

fn render_experience(cfg: &SiteConfig) -> String {
    cfg.experience
        .iter()
        .map(|e| {
            format!(
                r#"<article class="card"><h3>{} — {}</h3><p class="period">{}</p>{}</article>"#,
                escape_html(&e.company),
                escape_html(&e.title),
                escape_html(&e.period),
                text_or_list(&e.highlights, true),
            )
        })
        .collect()
}

fn render_certifications(cfg: &SiteConfig) -> Option<String> {
    cfg.certifications.as_ref().map(|certs| {
        certs
            .iter()
            .map(|c| {
                format!(
                    r#"<article class="card"><h3>{}</h3><p class="period">{} — {}</p></article>"#,
                    escape_html(&c.name),
                    escape_html(&c.issuer),
                    escape_html(&c.date),
                )
            })
            .collect()
    })
}

fn render_contact(cfg: &SiteConfig) -> String {
    cfg.links
        .iter()
        .filter_map(|(key, value)| {
            let url = value.primary_url()?;
            let label = match value {
                LinkValue::Formats(_) => "Resume".to_string(),
                _ => capitalize(key),
            };
            Some(external_link(url, None, &label))
        })
        .collect::<Vec<_>>()
        .join(CONTACT_SEPARATOR)
}

/// Render every region of the page.
pub fn render(cfg: &SiteConfig) -> RenderedPage {
    let page = RenderedPage {
        name: escape_html(&cfg.name),
        role: escape_html(&cfg.role),
        summary: text_or_list(&cfg.summary, false),
        hero_links: render_hero_links(cfg),
        tags: render_tags(cfg),
        projects: render_projects(cfg),
        experience: render_experience(cfg),
        certifications: render_certifications(cfg),
        contact: render_contact(cfg),
        title: escape_html(&cfg.meta.title),
        description: escape_html(&cfg.meta.description),
    };
    debug!(
        projects = cfg.projects.len(),
        experience = cfg.experience.len(),
        keywords = cfg.keywords.len(),
        "Rendered site config"
    );
    page
}
