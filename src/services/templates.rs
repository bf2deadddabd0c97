//! HTML email templates.
//!
//! Plain strings built by interpolation, one function per lifecycle event.
//! Values are not HTML-escaped; inputs are trusted admin/applicant fields
//! and the templates carry that known limitation.

/// A rendered email, ready for the mail provider.
#[derive(Debug, Clone)]
pub struct Email {
    pub subject: String,
    pub html: String,
}

/// Confirmation sent to the applicant right after submission.
pub fn application_confirmation(full_name: &str) -> Email {
    Email {
        subject: "We received your application".to_string(),
        html: format!(
            "<html><body>\
             <h2>Thanks for applying, {full_name}!</h2>\
             <p>Your application to join Workbridge as a professional has been \
             received and is waiting for review. We will email you as soon as \
             a decision is made.</p>\
             </body></html>"
        ),
    }
}

/// Alert sent to the admin inbox when a new application arrives.
pub fn admin_alert(full_name: &str, email: &str, category: &str) -> Email {
    Email {
        subject: format!("New professional application: {full_name}"),
        html: format!(
            "<html><body>\
             <h2>New application pending review</h2>\
             <p><strong>{full_name}</strong> ({email}) applied in the \
             <strong>{category}</strong> category.</p>\
             <p>Review it from the admin dashboard.</p>\
             </body></html>"
        ),
    }
}

/// Approval mail carrying the one-time signup link.
pub fn application_approved(full_name: &str, signup_url: &str) -> Email {
    Email {
        subject: "Your application was approved".to_string(),
        html: format!(
            "<html><body>\
             <h2>Welcome aboard, {full_name}!</h2>\
             <p>Your application has been approved. Finish creating your \
             account using the link below. The link can be used once.</p>\
             <p><a href=\"{signup_url}\">Complete your signup</a></p>\
             <p>If the link does not work, copy this address into your \
             browser:<br>{signup_url}</p>\
             </body></html>"
        ),
    }
}

/// Rejection mail. No token, no link.
pub fn application_rejected(full_name: &str) -> Email {
    Email {
        subject: "About your application".to_string(),
        html: format!(
            "<html><body>\
             <h2>Hello {full_name},</h2>\
             <p>Thank you for your interest in Workbridge. After review we \
             are unable to approve your application at this time.</p>\
             <p>You are welcome to apply again in the future.</p>\
             </body></html>"
        ),
    }
}

/// Sent to the winning professional when their bid is accepted.
pub fn bid_accepted(job_title: &str, amount: i64) -> Email {
    Email {
        subject: format!("Your bid on \"{job_title}\" was accepted"),
        html: format!(
            "<html><body>\
             <h2>Congratulations!</h2>\
             <p>Your bid of ${amount} on <strong>{job_title}</strong> was \
             accepted. The customer is expecting you to get in touch.</p>\
             </body></html>"
        ),
    }
}

/// Sent to losing bidders when a competing bid is accepted.
pub fn bid_rejected(job_title: &str) -> Email {
    Email {
        subject: format!("Update on your bid for \"{job_title}\""),
        html: format!(
            "<html><body>\
             <p>The customer selected another professional for \
             <strong>{job_title}</strong>. Your bid was not accepted this \
             time.</p>\
             <p>Browse open jobs to find your next project.</p>\
             </body></html>"
        ),
    }
}
