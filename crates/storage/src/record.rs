// Path: crates/storage/src/record.rs
//! Sealing and opening of primary records.
//!
//! A record is the bincode encoding of a [`Person`], sealed with the store's
//! [`RecordCipher`]. The 8-byte primary key is the AEAD associated data, so a
//! value moved under another key no longer authenticates.

use crate::tables::{k_people, BackendExt};
use persona_crypto::blind_index::NAME_DIGEST_LEN;
use persona_crypto::{KeyMaterial, NameDigest, RecordCipher};
use persona_types::{CryptoError, Person, PersonId, Result, StoreError};
use redb::ReadableTable;

const VERIFIER_MARKER: &[u8] = b"persona-key-check";
const VERIFIER_AAD: &[u8] = b"keyring/verifier";

/// The store's view of its key material.
#[derive(Debug, Clone)]
pub(crate) struct RecordCodec {
    cipher: RecordCipher,
    names: NameDigest,
}

impl RecordCodec {
    pub(crate) fn new(keys: &KeyMaterial) -> Self {
        Self {
            cipher: keys.record_cipher(),
            names: keys.name_digest(),
        }
    }

    pub(crate) fn names(&self) -> &NameDigest {
        &self.names
    }

    pub(crate) fn name_key(&self, name: &str) -> [u8; NAME_DIGEST_LEN] {
        self.names.digest(name)
    }

    pub(crate) fn seal(&self, person: &Person) -> Result<Vec<u8>> {
        let plain = bincode::serialize(person).map_err(|e| StoreError::Encode(e.to_string()))?;
        Ok(self.cipher.seal(&plain, &k_people(person.id))?)
    }

    pub(crate) fn open(&self, id: PersonId, sealed: &[u8]) -> Result<Person> {
        let plain = self.cipher.open(sealed, &k_people(id))?;
        let person: Person =
            bincode::deserialize(&plain).map_err(|e| StoreError::Decode(e.to_string()))?;
        if person.id != id {
            return Err(StoreError::Corrupt(format!(
                "record stored under id {id} decodes as id {}",
                person.id
            )));
        }
        Ok(person)
    }

    /// Fetches and opens the record stored under `id`, if any.
    pub(crate) fn load<T>(&self, people: &T, id: PersonId) -> Result<Option<Person>>
    where
        T: ReadableTable<&'static [u8; 8], &'static [u8]>,
    {
        people
            .get(&k_people(id))
            .backend()?
            .map(|sealed| self.open(id, sealed.value()))
            .transpose()
    }

    pub(crate) fn seal_verifier(&self) -> Result<Vec<u8>> {
        Ok(self.cipher.seal(VERIFIER_MARKER, VERIFIER_AAD)?)
    }

    /// Fails with [`CryptoError::KeyMismatch`] unless `sealed` was produced
    /// by [`seal_verifier`](Self::seal_verifier) under the same key.
    pub(crate) fn check_verifier(&self, sealed: &[u8]) -> Result<()> {
        match self.cipher.open(sealed, VERIFIER_AAD) {
            Ok(marker) if marker == VERIFIER_MARKER => Ok(()),
            Ok(_) | Err(CryptoError::AuthenticationFailed) => Err(CryptoError::KeyMismatch.into()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_types::PersonDraft;
    use time::OffsetDateTime;

    fn codec(pass: &str) -> RecordCodec {
        RecordCodec::new(&KeyMaterial::from_passphrase(pass).unwrap())
    }

    fn person(id: PersonId) -> Person {
        PersonDraft::new("Alice", "1994-05-01")
            .with_gender("Female")
            .validate()
            .unwrap()
            .into_person(id, OffsetDateTime::from_unix_timestamp(1_690_000_000).unwrap())
    }

    #[test]
    fn sealed_record_hides_name_and_roundtrips() {
        let c = codec("pw");
        let sealed = c.seal(&person(1)).unwrap();
        assert!(!sealed.windows(5).any(|w| w == b"Alice"));
        assert_eq!(c.open(1, &sealed).unwrap(), person(1));
    }

    #[test]
    fn record_is_bound_to_its_key() {
        let c = codec("pw");
        let sealed = c.seal(&person(1)).unwrap();
        assert!(matches!(
            c.open(2, &sealed),
            Err(StoreError::Crypto(CryptoError::AuthenticationFailed))
        ));
    }

    #[test]
    fn verifier_detects_other_keys() {
        let sealed = codec("pw").seal_verifier().unwrap();
        codec("pw").check_verifier(&sealed).unwrap();
        assert!(matches!(
            codec("other").check_verifier(&sealed),
            Err(StoreError::Crypto(CryptoError::KeyMismatch))
        ));
    }
}
