/// A rendered message: subject plus plain and HTML alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
}

/// Welcome message carrying the activation token for a new account.
pub fn user_welcome(user_id: i64, activation_token: &str) -> Email {
    let subject = "Welcome to Reelbase!".to_string();

    let plain_body = format!(
        "Hi,\n\n\
         Thanks for signing up for a Reelbase account. We're excited to have you on board!\n\n\
         For future reference, your user ID number is {user_id}.\n\n\
         Please send a request to the `PUT /v1/users/activated` endpoint with the following JSON\n\
         body to activate your account:\n\n\
         {{\"token\": \"{activation_token}\"}}\n\n\
         Please note that this is a one-time use token and it will expire in 3 days.\n\n\
         Thanks,\n\n\
         The Reelbase Team\n"
    );

    let html_body = format!(
        "<!doctype html>\n\
         <html>\n\
         <head>\n\
         <meta name=\"viewport\" content=\"width=device-width\" />\n\
         <meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\" />\n\
         </head>\n\
         <body>\n\
         <p>Hi,</p>\n\
         <p>Thanks for signing up for a Reelbase account. We're excited to have you on board!</p>\n\
         <p>For future reference, your user ID number is {user_id}.</p>\n\
         <p>Please send a request to the <code>PUT /v1/users/activated</code> endpoint with the \
         following JSON body to activate your account:</p>\n\
         <pre><code>\n\
         {{\"token\": \"{activation_token}\"}}\n\
         </code></pre>\n\
         <p>Please note that this is a one-time use token and it will expire in 3 days.</p>\n\
         <p>Thanks,</p>\n\
         <p>The Reelbase Team</p>\n\
         </body>\n\
         </html>\n"
    );

    Email {
        subject,
        plain_body,
        html_body,
    }
}
