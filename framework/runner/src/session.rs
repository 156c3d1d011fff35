use api_load_client::prelude::{Attacker, Connection};

/// Hands out a new [Attacker] for every scenario, all sharing the same authenticated connection.
///
/// Result tooling expects the request sequence in each result file to start at zero, which only
/// holds if a session is never reused across scenarios.
#[derive(Debug)]
pub struct AttackSessionFactory<'c> {
    connection: &'c Connection,
}

impl<'c> AttackSessionFactory<'c> {
    pub fn new(connection: &'c Connection) -> Self {
        Self { connection }
    }

    pub fn new_session(&self) -> Attacker {
        let attacker = Attacker::new(self.connection.clone());
        log::debug!("Created attack session {}", attacker.session_id());
        attacker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_are_never_shared() {
        let connection = Connection::with_access_token("http://localhost", "token").unwrap();
        let factory = AttackSessionFactory::new(&connection);

        let first = factory.new_session();
        let second = factory.new_session();

        assert_ne!(first.session_id(), second.session_id());
        assert_eq!(0, second.sequence());
    }
}
