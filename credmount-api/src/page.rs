//! HTML rendering of the credential form and workload status table

use credmount_common::{DeploymentStatus, StatusMessage};

use crate::validation::sanitize_html;

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; color: #222; }
form { display: grid; gap: 0.5rem; margin-bottom: 2rem; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 0.4rem; border-bottom: 1px solid #ddd; }
.message { padding: 0.6rem 0.8rem; border-radius: 4px; margin-bottom: 1rem; }
.message.info { background: #e7f1ff; }
.message.success { background: #e6f6ea; }
.message.warning { background: #fff6e0; }
.message.error { background: #fdecea; }
.ready { color: #1a7f37; }
.pending { color: #9a6700; }
"#;

/// Everything one render of the index page shows
#[derive(Debug, Clone, Default)]
pub struct IndexPage {
    pub message: StatusMessage,
    pub deployments: Vec<DeploymentStatus>,
}

impl IndexPage {
    pub fn new(message: StatusMessage, deployments: Vec<DeploymentStatus>) -> Self {
        Self {
            message,
            deployments,
        }
    }

    pub fn render(&self) -> String {
        let mut html = String::with_capacity(2048);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n<title>Database Credentials</title>\n");
        html.push_str(&format!("<style>{}</style>\n", STYLE));
        html.push_str("</head>\n<body>\n<h1>Database Credentials</h1>\n");

        if !self.message.is_empty() {
            html.push_str(&format!(
                "<div class=\"message {}\" data-severity=\"{}\">{}</div>\n",
                self.message.severity,
                self.message.severity,
                sanitize_html(&self.message.text)
            ));
        }

        html.push_str(
            "<form method=\"post\" action=\"/\">\n\
             <label for=\"db_name\">Database name</label>\n\
             <input id=\"db_name\" name=\"db_name\" type=\"text\" required>\n\
             <label for=\"db_password\">Database password</label>\n\
             <input id=\"db_password\" name=\"db_password\" type=\"password\" required>\n\
             <button type=\"submit\">Save and mount</button>\n\
             </form>\n",
        );

        html.push_str("<h2>Deployments</h2>\n");
        if self.deployments.is_empty() {
            html.push_str("<p class=\"empty\">No deployments yet.</p>\n");
        } else {
            html.push_str(
                "<table>\n<thead><tr><th>Secret</th><th>Ready</th><th>Total</th></tr></thead>\n<tbody>\n",
            );
            for row in &self.deployments {
                let class = if row.readiness().is_ready() {
                    "ready"
                } else {
                    "pending"
                };
                html.push_str(&format!(
                    "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                    class,
                    sanitize_html(&row.name),
                    row.ready_replicas,
                    row.total_replicas
                ));
            }
            html.push_str("</tbody>\n</table>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}
