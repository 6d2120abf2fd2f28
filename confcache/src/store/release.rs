// Copyright 2026 confcache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use confcache_memory::{Interned, StringPool};

use crate::model::{
    Action, ActionCondition, AutoregPsk, CorrCondition, CorrConditionKind, Correlation, Credentials, Expression,
    Function, GlobalMacro, Host, HostGroup, HostInventory, HostMacro, HostTag, HttpAgentItem, Interface, IpmiHost, Item,
    ItemKind, MaintenanceTag, PreprocStep, Proxy, Psk, SnmpItem, Trigger, TriggerTag, ValueExt,
};

/// Gives every pooled string owned by a record back to the pool.
pub(crate) trait Release {
    fn release(self, pool: &mut StringPool);
}

impl Release for Interned {
    fn release(self, pool: &mut StringPool) {
        pool.release(self);
    }
}

impl<T: Release> Release for Option<T> {
    fn release(self, pool: &mut StringPool) {
        if let Some(v) = self {
            v.release(pool);
        }
    }
}

impl<T: Release> Release for Vec<T> {
    fn release(self, pool: &mut StringPool) {
        for v in self {
            v.release(pool);
        }
    }
}

macro_rules! release_fields {
    ($ty:ty => $($field:ident),+) => {
        impl Release for $ty {
            fn release(self, pool: &mut StringPool) {
                $( self.$field.release(pool); )+
            }
        }
    };
}

release_fields!(IpmiHost => username, password);
release_fields!(Host => host, name, tls_issuer, tls_subject, ipmi);
release_fields!(Proxy => proxy_address);
release_fields!(Interface => ip, dns, port);
release_fields!(HostInventory => values);
release_fields!(Psk => identity, value);
release_fields!(AutoregPsk => identity, value);
release_fields!(Credentials => username, password);
release_fields!(SnmpItem => community, oid, securityname, authpassphrase, privpassphrase, contextname);
release_fields!(
    HttpAgentItem => timeout, url, query_fields, posts, status_codes, http_proxy, headers, ssl_cert_file,
    ssl_key_file, ssl_key_password, credentials, trapper_hosts
);
release_fields!(Item => key, port, delay, history, kind, value_ext);
release_fields!(PreprocStep => params);
release_fields!(Function => function, parameter);
release_fields!(Trigger => description, expression, recovery_expression, correlation_tag);
release_fields!(TriggerTag => tag, value);
release_fields!(GlobalMacro => name, context, value);
release_fields!(HostMacro => name, context, value);
release_fields!(HostTag => tag, value);
release_fields!(HostGroup => name);
release_fields!(MaintenanceTag => tag, value);
release_fields!(Expression => regexp, expression);
release_fields!(Action => formula);
release_fields!(ActionCondition => value, value2);
release_fields!(Correlation => name, formula);
release_fields!(CorrCondition => kind);

impl<T: Release> Release for Box<T> {
    fn release(self, pool: &mut StringPool) {
        (*self).release(pool);
    }
}

impl Release for ItemKind {
    fn release(self, pool: &mut StringPool) {
        match self {
            ItemKind::Plain | ItemKind::Dependent { .. } => {}
            ItemKind::Snmp(snmp) => snmp.release(pool),
            ItemKind::Ipmi { sensor } => sensor.release(pool),
            ItemKind::Trapper { trapper_hosts } => trapper_hosts.release(pool),
            ItemKind::DbMonitor { params, credentials } => {
                params.release(pool);
                credentials.release(pool);
            }
            ItemKind::Ssh {
                credentials,
                publickey,
                privatekey,
                params,
                ..
            } => {
                credentials.release(pool);
                publickey.release(pool);
                privatekey.release(pool);
                params.release(pool);
            }
            ItemKind::Telnet { credentials, params } => {
                credentials.release(pool);
                params.release(pool);
            }
            ItemKind::Simple { credentials } => credentials.release(pool),
            ItemKind::Jmx { credentials, endpoint } => {
                credentials.release(pool);
                endpoint.release(pool);
            }
            ItemKind::Calculated { params } => params.release(pool),
            ItemKind::HttpAgent(http) => http.release(pool),
        }
    }
}

impl Release for ValueExt {
    fn release(self, pool: &mut StringPool) {
        match self {
            ValueExt::None => {}
            ValueExt::Numeric { units, trends } => {
                units.release(pool);
                trends.release(pool);
            }
            ValueExt::Log { logtimefmt } => logtimefmt.release(pool),
        }
    }
}

impl Release for CorrConditionKind {
    fn release(self, pool: &mut StringPool) {
        match self {
            CorrConditionKind::OldEventTag { tag } | CorrConditionKind::NewEventTag { tag } => tag.release(pool),
            CorrConditionKind::NewEventHostGroup { .. } => {}
            CorrConditionKind::EventTagPair { oldtag, newtag } => {
                oldtag.release(pool);
                newtag.release(pool);
            }
            CorrConditionKind::OldEventTagValue { tag, value, .. }
            | CorrConditionKind::NewEventTagValue { tag, value, .. } => {
                tag.release(pool);
                value.release(pool);
            }
        }
    }
}
