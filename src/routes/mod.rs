/// Router Module Index
///
/// Splits routing by access level so the authentication layer is applied to a whole
/// router at once rather than remembered per handler.

/// Routes open to everyone: the post listing, account pages and the health probe.
pub mod public;

/// Routes behind the session gate. Anonymous requests are redirected to the login page.
pub mod authenticated;
