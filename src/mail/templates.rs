/// A rendered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub body: String,
}

pub const ACCOUNT_CREATED_SUBJECT: &str = "Your STI Archives Account Has Been Created!";
pub const ACCOUNT_VERIFIED_SUBJECT: &str = "Your STI Archives Account Has Been Verified!";

fn credentials_email(
    subject: &str,
    headline: &str,
    name: &str,
    school_email: &str,
    password: &str,
    login_url: &str,
) -> Email {
    let body = format!(
        "Hello {name},\n\
         \n\
         {headline}\n\
         \n\
         🔑 Login Credentials:\n\
         - Email: {school_email}\n\
         - Password: {password}\n\
         \n\
         You can now log in at: {login_url}\n\
         \n\
         Please keep this information secure.\n\
         \n\
         Best regards,\n\
         STI Archives Team"
    );

    Email {
        subject: subject.to_string(),
        body,
    }
}

/// Sent straight after credentials are generated on request
pub fn account_created(name: &str, school_email: &str, password: &str, login_url: &str) -> Email {
    credentials_email(
        ACCOUNT_CREATED_SUBJECT,
        "Your STI Archives account has been successfully created!",
        name,
        school_email,
        password,
        login_url,
    )
}

/// Sent when an administrator accepts a signup
pub fn account_verified(name: &str, school_email: &str, password: &str, login_url: &str) -> Email {
    credentials_email(
        ACCOUNT_VERIFIED_SUBJECT,
        "Your STI Archives account has been verified by the admin!",
        name,
        school_email,
        password,
        login_url,
    )
}
