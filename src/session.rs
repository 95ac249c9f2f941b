// src/session.rs
//! Сессия генерации: «последний запрос побеждает»
//!
//! Конвейер сам по себе чистый и ничего не знает о конкурирующих запусках.
//! [`MapSession`] выдаёт каждому запуску возрастающий билет и принимает результат
//! только от самого свежего билета; запоздавшие результаты отбрасываются и
//! никогда не перезаписывают карту, начатую с более новыми сидом или конфигурацией.

use crate::config::{ConfigError, GenerationConfig};
use crate::pipeline::{WorldMap, generate};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Номер запуска генерации внутри сессии
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct MapSession {
    request_counter: AtomicU64,
    current: Mutex<Option<(Ticket, Arc<WorldMap>)>>,
}

impl Default for MapSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_counter: AtomicU64::new(1),
            current: Mutex::new(None),
        }
    }

    /// Открывает новый запуск; все ранее выданные билеты становятся устаревшими
    pub fn begin(&self) -> Ticket {
        Ticket(self.request_counter.fetch_add(1, Ordering::SeqCst))
    }

    /// Последний выданный билет
    #[must_use]
    pub fn latest(&self) -> Option<Ticket> {
        match self.request_counter.load(Ordering::SeqCst) {
            1 => None,
            next => Some(Ticket(next - 1)),
        }
    }

    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest() == Some(ticket)
    }

    /// Устанавливает карту, если `ticket` всё ещё самый свежий.
    ///
    /// Возвращает `false`, если результат устарел и был отброшен.
    pub fn submit(&self, ticket: Ticket, map: WorldMap) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        // `begin` замок не берёт, поэтому билет может устареть сразу после проверки.
        // Замок гарантирует лишь, что из двух `submit` карту не перезапишет более старый
        if !self.is_current(ticket) {
            tracing::debug!(
                target: "fantasy_mapgen::session",
                ticket = ticket.id(),
                latest = self.latest().map(Ticket::id),
                "session.stale_result"
            );
            return false;
        }
        *current = Some((ticket, Arc::new(map)));
        true
    }

    /// Текущая карта, если она есть
    #[must_use]
    pub fn current(&self) -> Option<Arc<WorldMap>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, map)| Arc::clone(map))
    }

    /// Полный цикл: билет, генерация, попытка установить результат.
    ///
    /// `Ok(None)` означает, что пока шла генерация, был начат более новый запуск.
    pub fn regenerate(
        &self,
        seed: u64,
        config: &GenerationConfig,
    ) -> Result<Option<Arc<WorldMap>>, ConfigError> {
        let ticket = self.begin();
        let map = generate(seed, config)?;
        if self.submit(ticket, map) {
            Ok(self.current())
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_map(seed: u64) -> WorldMap {
        let config = GenerationConfig {
            width: 64,
            height: 48,
            ..GenerationConfig::default()
        };
        generate(seed, &config).unwrap()
    }

    #[test]
    fn tickets_increase() {
        let session = MapSession::new();
        assert_eq!(session.latest(), None);
        let a = session.begin();
        let b = session.begin();
        assert!(b > a);
        assert!(session.is_current(b));
        assert!(!session.is_current(a));
    }

    #[test]
    fn stale_result_is_discarded() {
        let session = MapSession::new();
        let old = session.begin();
        let new = session.begin();

        assert!(session.submit(new, tiny_map(2)));
        assert!(!session.submit(old, tiny_map(1)));
        assert_eq!(session.current().unwrap().seed, 2);
    }

    #[test]
    fn result_after_newer_begin_is_dropped() {
        let session = MapSession::new();
        let first = session.begin();
        let _second = session.begin();
        assert!(!session.submit(first, tiny_map(1)));
        assert!(session.current().is_none());
    }

    #[test]
    fn begin_after_submit_keeps_installed_map() {
        let session = MapSession::new();
        let first = session.begin();
        assert!(session.submit(first, tiny_map(1)));

        // Новый запуск не снимает уже установленную карту
        let second = session.begin();
        assert!(!session.is_current(first));
        assert_eq!(session.current().unwrap().seed, 1);
        assert!(session.submit(second, tiny_map(2)));
        assert_eq!(session.current().unwrap().seed, 2);
    }

    #[test]
    fn regenerate_installs_map() {
        let session = MapSession::default();
        let config = GenerationConfig {
            width: 64,
            height: 48,
            ..GenerationConfig::default()
        };
        let map = session.regenerate(77, &config).unwrap().unwrap();
        assert_eq!(map.seed, 77);
        assert_eq!(session.current().unwrap().seed, 77);
    }

    #[test]
    fn regenerate_rejects_invalid_config() {
        let session = MapSession::new();
        let config = GenerationConfig {
            height: 0,
            ..GenerationConfig::default()
        };
        assert!(session.regenerate(1, &config).is_err());
        assert!(session.current().is_none());
    }
}
