//! Tera templates compiled into the binary
//!
//! Every page extends `base.html`, which renders the flash messages and the
//! navigation. Autoescaping is on for all of them.

use tera::{Context, Tera};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("kiosk.html", include_str!("../templates/kiosk.html")),
    (
        "attendance_confirmation.html",
        include_str!("../templates/attendance_confirmation.html"),
    ),
    ("dashboard.html", include_str!("../templates/dashboard.html")),
    ("admin/students.html", include_str!("../templates/admin/students.html")),
    ("admin/student_form.html", include_str!("../templates/admin/student_form.html")),
    ("admin/classes.html", include_str!("../templates/admin/classes.html")),
    ("admin/class_form.html", include_str!("../templates/admin/class_form.html")),
    ("admin/users.html", include_str!("../templates/admin/users.html")),
    (
        "admin/attendance_report.html",
        include_str!("../templates/admin/attendance_report.html"),
    ),
    ("auth/register.html", include_str!("../templates/auth/register.html")),
];

/// The compiled page templates
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Parses every template
    ///
    /// # Errors
    ///
    /// Fails when a template has a syntax error or extends a missing parent.
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        tracing::debug!(count = TEMPLATES.len(), "Templates loaded");
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(name, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_parse() {
        let templates = Templates::new().unwrap();
        let names: Vec<&str> = templates.tera.get_template_names().collect();
        assert_eq!(names.len(), TEMPLATES.len());
    }

    #[test]
    fn test_index_escapes_class_names() {
        let templates = Templates::new().unwrap();
        let mut context = Context::new();
        context.insert("messages", &Vec::<String>::new());
        context.insert("today", "Monday, March 04, 2024");
        context.insert(
            "classes",
            &vec![serde_json::json!({
                "id": 1,
                "name": "<b>Salsa</b>",
                "instructor_name": "Maria",
                "schedule": "18:00 - 19:00",
                "description": null,
            })],
        );

        let html = templates.render("index.html", &context).unwrap();
        assert!(html.contains("&lt;b&gt;Salsa&lt;&#x2F;b&gt;"));
    }
}
