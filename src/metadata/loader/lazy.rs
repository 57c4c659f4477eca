//! Deferred materialization for lazy type definitions.
//!
//! A [`LazySource`] pairs a loader clone (with the interning pool disabled, since the real
//! pool is not safe for concurrent writers) with the shared module handle and the source
//! type. Each slot follows the same discipline: acquire the module-wide lock, re-check the
//! slot, compute, publish. Readers that lost the race to a winning writer observe the
//! published list; duplicate computation cannot happen because the re-check runs under the
//! lock.

use std::sync::{Arc, OnceLock};

use crate::{
    metadata::{
        loader::LoaderCore,
        source,
        unresolved::{LazyTypeSource, MemberList, TypeDefList, TypeRefList, UnresolvedTypeDefRc},
    },
    Result,
};

pub(crate) struct LazySource {
    loader: Arc<LoaderCore>,
    handle: Arc<source::ModuleHandle>,
    raw: Arc<source::TypeDef>,
}

impl LazySource {
    pub(crate) fn new(
        loader: Arc<LoaderCore>,
        handle: Arc<source::ModuleHandle>,
        raw: Arc<source::TypeDef>,
    ) -> Self {
        LazySource {
            loader,
            handle,
            raw,
        }
    }
}

impl LazyTypeSource for LazySource {
    fn base_types(&self, slot: &OnceLock<TypeRefList>) -> Result<TypeRefList> {
        let _module = self.handle.lock();
        if let Some(published) = slot.get() {
            return Ok(published.clone());
        }
        let computed = self.loader.read_base_types(&self.raw);
        let _ = slot.set(computed.clone());
        Ok(computed)
    }

    fn nested_types(&self, slot: &OnceLock<TypeDefList>) -> Result<TypeDefList> {
        let _module = self.handle.lock();
        if let Some(published) = slot.get() {
            return Ok(published.clone());
        }
        let computed = self.loader.read_nested_types(&self.raw)?;
        let _ = slot.set(computed.clone());
        Ok(computed)
    }

    fn members(
        &self,
        owner: &UnresolvedTypeDefRc,
        slot: &OnceLock<MemberList>,
    ) -> Result<MemberList> {
        let _module = self.handle.lock();
        if let Some(published) = slot.get() {
            return Ok(published.clone());
        }
        let members: MemberList = self.loader.read_members(&self.raw)?.into();
        for member in members.iter() {
            member.bind_declaring(owner);
        }
        let _ = slot.set(members.clone());
        for member in members.iter() {
            self.loader.notify_member(member);
        }
        Ok(members)
    }
}
