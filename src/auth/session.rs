//! Sign-out hook invoked when a session cannot be recovered.

/// Owner of the signed-in session.
///
/// The coordinator calls [`SessionOwner::sign_out`] at most once per failed
/// refresh episode. The call is fire-and-forget; implementations should not
/// block.
pub trait SessionOwner: Send + Sync {
    fn sign_out(&self);
}

impl<F> SessionOwner for F
where
    F: Fn() + Send + Sync,
{
    fn sign_out(&self) {
        self()
    }
}
