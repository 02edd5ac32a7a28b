/// Session context for a request.
///
/// Inserted by the session middleware once the cookie has been verified;
/// its presence on a request proves the caller is authenticated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionContext(());

impl SessionContext {
    pub(crate) fn new() -> Self {
        Self(())
    }
}
