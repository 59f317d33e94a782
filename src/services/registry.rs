use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::{ConfirmError, LockError};
use crate::models::{Seat, SeatId, SeatStatus};
use crate::services::clock::{Clock, SystemClock};

pub const DEFAULT_TOTAL_SEATS: u32 = 20;
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 60_000;

// Внутреннее состояние места. Поля блокировки существуют только у Locked,
// поэтому "свободное место с владельцем" непредставимо.
#[derive(Debug, Clone)]
enum SeatSlot {
    Available,
    Locked {
        by: String,
        expires_at: DateTime<Utc>,
    },
    Booked,
}

impl SeatSlot {
    fn snapshot(&self, id: SeatId) -> Seat {
        match self {
            SeatSlot::Available => Seat::available(id),
            SeatSlot::Locked { by, expires_at } => Seat {
                id,
                status: SeatStatus::Locked,
                locked_by: Some(by.clone()),
                lock_expires_at: Some(*expires_at),
            },
            SeatSlot::Booked => Seat {
                id,
                status: SeatStatus::Booked,
                locked_by: None,
                lock_expires_at: None,
            },
        }
    }
}

/// Единственный владелец состояния всех мест.
///
/// Каждое место защищено своим мьютексом: `lock` и `confirm` на одном месте
/// линеаризуемы, операции на разных местах друг друга не блокируют.
/// Истечение блокировки ленивое - проверяется только при `lock`/`confirm`,
/// фоновой очистки нет.
pub struct SeatRegistry {
    seats: Vec<Mutex<SeatSlot>>,
    lock_duration: Duration,
    clock: Arc<dyn Clock>,
}

impl SeatRegistry {
    pub fn new(total_seats: u32, lock_duration: Duration) -> Self {
        Self::with_clock(total_seats, lock_duration, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(total_seats: u32, lock_duration: Duration, clock: Arc<dyn Clock>) -> Self {
        let seats = (0..total_seats)
            .map(|_| Mutex::new(SeatSlot::Available))
            .collect();

        Self {
            seats,
            lock_duration,
            clock,
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.total_seats, config.lock_duration())
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn lock_duration(&self) -> Duration {
        self.lock_duration
    }

    /// Снимок всех мест. Просроченные блокировки видны как `locked`,
    /// пока их не тронет следующая изменяющая операция.
    pub fn list_all(&self) -> Vec<Seat> {
        self.seats
            .iter()
            .zip(1..)
            .map(|(cell, id)| guard(cell).snapshot(id))
            .collect()
    }

    pub fn get(&self, seat_id: SeatId) -> Option<Seat> {
        self.cell(seat_id).map(|cell| guard(cell).snapshot(seat_id))
    }

    /// Ставит временную блокировку места за `claimant`.
    ///
    /// Место блокируется, если оно свободно или его блокировка уже истекла.
    /// Повторный `lock` тем же владельцем до истечения не продлевает
    /// блокировку, а отклоняется как `AlreadyLocked`.
    pub fn lock(&self, seat_id: SeatId, claimant: &str) -> Result<Seat, LockError> {
        if claimant.is_empty() {
            return Err(LockError::InvalidClaimant);
        }
        let cell = self.cell(seat_id).ok_or(LockError::NotFound(seat_id))?;

        let mut slot = guard(cell);
        let now = self.clock.now();

        match &*slot {
            SeatSlot::Booked => {
                debug!("Lock on seat {} rejected: already booked", seat_id);
                return Err(LockError::AlreadyBooked(seat_id));
            }
            SeatSlot::Locked { expires_at, .. } if now <= *expires_at => {
                debug!("Lock on seat {} rejected for {}: lock still active", seat_id, claimant);
                return Err(LockError::AlreadyLocked(seat_id));
            }
            SeatSlot::Locked { by, .. } => {
                info!(seat_id, previous = %by, "Reclaiming expired lock");
            }
            SeatSlot::Available => {}
        }

        let expires_at = now
            .checked_add_signed(self.lock_duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        *slot = SeatSlot::Locked {
            by: claimant.to_string(),
            expires_at,
        };

        info!(seat_id, claimant, %expires_at, "Seat locked");
        Ok(slot.snapshot(seat_id))
    }

    /// Подтверждает бронь места, заблокированного тем же `claimant`.
    ///
    /// Если блокировка владельца истекла, место освобождается и
    /// возвращается `LockExpired`. Успешное подтверждение терминально.
    pub fn confirm(&self, seat_id: SeatId, claimant: &str) -> Result<Seat, ConfirmError> {
        if claimant.is_empty() {
            return Err(ConfirmError::InvalidClaimant);
        }
        let cell = self.cell(seat_id).ok_or(ConfirmError::NotFound(seat_id))?;

        let mut slot = guard(cell);
        let now = self.clock.now();

        let expired = match &*slot {
            SeatSlot::Available | SeatSlot::Booked => {
                debug!("Confirm on seat {} rejected: not locked", seat_id);
                return Err(ConfirmError::NotLocked(seat_id));
            }
            SeatSlot::Locked { by, .. } if by.as_str() != claimant => {
                debug!("Confirm on seat {} rejected for {}: locked by another claimant", seat_id, claimant);
                return Err(ConfirmError::ForbiddenClaimant(seat_id));
            }
            SeatSlot::Locked { expires_at, .. } => now > *expires_at,
        };

        if expired {
            *slot = SeatSlot::Available;
            info!(seat_id, claimant, "Lock expired before confirmation, seat released");
            return Err(ConfirmError::LockExpired(seat_id));
        }

        *slot = SeatSlot::Booked;
        info!(seat_id, claimant, "Seat booked");
        Ok(slot.snapshot(seat_id))
    }

    // id плотные в [1, N], поэтому поиск - прямой индекс
    fn cell(&self, seat_id: SeatId) -> Option<&Mutex<SeatSlot>> {
        let index = usize::try_from(seat_id).ok()?.checked_sub(1)?;
        self.seats.get(index)
    }
}

impl Default for SeatRegistry {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

// Критическая секция содержит только присваивания, так что после паники
// в другом потоке состояние места остаётся целым.
fn guard(cell: &Mutex<SeatSlot>) -> MutexGuard<'_, SeatSlot> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}
