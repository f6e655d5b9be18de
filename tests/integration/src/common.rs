//! Common test utilities and fixtures

#![allow(dead_code)]

use idm::codegen::InMemoryStorage;
use idm::{CodegenRunOptions, GeneratedOutputs, Idl, PipelineContext};
use tracing_subscriber::EnvFilter;

/// Initialize logging for tests, honoring `RUST_LOG`
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The Identify cluster and an endpoint serving it, with the fields of
/// `IdentifyRequest` spliced in
pub fn identify_idl(request_fields: &str) -> String {
    format!(
        r#"
/** Attributes and commands for putting a device into Identification mode. */
server cluster Identify = 3 {{
  revision 4;

  enum EffectIdentifierEnum : enum8 {{
    kBlink = 0;
    kBreathe = 1;
  }}

  request struct IdentifyRequest {{
    {request_fields}
  }}

  request struct TriggerEffectRequest {{
    EffectIdentifierEnum effectIdentifier = 0;
    int8u effectVariant = 1;
  }}

  attribute int16u identifyTime = 0;
  readonly attribute enum8 identifyType = 1;
  readonly attribute int16u clusterRevision = 65533;

  command access(invoke: manage) Identify(IdentifyRequest): DefaultSuccess = 0;
  command access(invoke: manage) TriggerEffect(TriggerEffectRequest): DefaultSuccess = 64;
}}

endpoint 1 {{
  server cluster Identify {{
    ram attribute identifyTime default = 0;
    ram attribute identifyType default = 2;
    ram attribute clusterRevision default = 4;
    handle command Identify;
    handle command TriggerEffect;
  }}
}}
"#
    )
}

pub fn identify() -> Idl {
    idm::parse_idl(&identify_idl("int16u identifyTime = 0;"), "identify.matter")
        .expect("identify fixture parses")
}

pub const IDENTIFY_XML: &str = r#"<?xml version="1.0"?>
<configurator>
  <domain name="General"/>
  <enum name="EffectIdentifierEnum" type="ENUM8">
    <cluster code="0x0003"/>
    <item name="Blink" value="0x00"/>
    <item name="Breathe" value="0x01"/>
  </enum>
  <cluster>
    <domain>General</domain>
    <name>Identify</name>
    <code>0x0003</code>
    <define>IDENTIFY_CLUSTER</define>
    <description>Attributes and commands for putting a device into Identification mode.</description>
    <client tick="false" init="false">true</client>
    <server tick="false" init="false">true</server>
    <globalAttribute side="either" code="0xFFFD" value="4"/>
    <attribute side="server" code="0x0000" define="IDENTIFY_TIME" type="INT16U" writable="true" optional="false">identify time</attribute>
    <attribute side="server" code="0x0001" name="IdentifyType" define="IDENTIFY_TYPE" type="ENUM8" writable="false"/>
    <command source="client" code="0x00" name="Identify" optional="false">
      <description>Command description for Identify</description>
      <arg name="IdentifyTime" type="INT16U"/>
      <access op="invoke" privilege="manage"/>
    </command>
    <command source="client" code="0x40" name="TriggerEffect" optional="true">
      <arg name="EffectIdentifier" type="EffectIdentifierEnum"/>
      <arg name="EffectVariant" type="INT8U"/>
      <access op="invoke" privilege="manage"/>
    </command>
  </cluster>
</configurator>
"#;

/// A small lighting application: two clusters, a client binding and two
/// endpoints
pub const LIGHTING_IDL: &str = r#"
enum StatusCode : enum8 {
  kBusy = 2;
  kFailure = 3;
}

server cluster Descriptor = 29 {
  struct DeviceTypeStruct {
    devtype_id deviceType = 0;
    int16u revision = 1;
  }

  readonly attribute DeviceTypeStruct deviceTypeList[] = 0;
  readonly attribute cluster_id serverList[] = 1;
  readonly attribute bitmap32 featureMap = 65532;
  readonly attribute int16u clusterRevision = 65533;
}

/** Attributes and commands for switching devices between 'On' and 'Off' states. */
server cluster OnOff = 6 {
  revision 6;

  bitmap Feature : bitmap32 {
    kLighting = 0x1;
  }

  enum StartUpOnOffEnum : enum8 {
    kOff = 0;
    kOn = 1;
    kToggle = 2;
  }

  request struct OffWithEffectRequest {
    enum8 effectIdentifier = 0;
    enum8 effectVariant = 1;
  }

  info event StateChanged = 0 {
    boolean onOff = 0;
  }

  readonly attribute boolean onOff = 0;
  attribute access(write: manage) nullable StartUpOnOffEnum startUpOnOff = 16387;
  readonly attribute Feature featureMap = 65532;
  readonly attribute int16u clusterRevision = 65533;

  command Off(): DefaultSuccess = 0;
  command On(): DefaultSuccess = 1;
  command OffWithEffect(OffWithEffectRequest): DefaultSuccess = 64;
}

client cluster OnOff = 6 {
  readonly attribute boolean onOff = 0;
  command Off(): DefaultSuccess = 0;
}

endpoint 0 {
  device type ma_rootdevice = 22, version 1;

  server cluster Descriptor {
    callback attribute deviceTypeList;
    callback attribute serverList;
    ram attribute featureMap default = 0;
    ram attribute clusterRevision default = 1;
  }
}

endpoint 1 {
  device type ma_onofflight = 256, version 1;
  binding cluster OnOff;

  server cluster OnOff {
    emits event StateChanged;
    persist attribute onOff default = 0;
    persist attribute startUpOnOff;
    ram attribute featureMap default = 1;
    ram attribute clusterRevision default = 6;
    handle command Off;
    handle command On;
  }

  server cluster Descriptor {
    callback attribute deviceTypeList;
    callback attribute serverList;
    ram attribute featureMap default = 0;
    ram attribute clusterRevision default = 1;
  }
}
"#;

pub fn lighting() -> Idl {
    idm::parse_idl(LIGHTING_IDL, "lighting.matter").expect("lighting fixture parses")
}

/// Run generator `key` against `idl` into fresh in-memory storage
pub fn generate(key: &str, idl: &Idl) -> (GeneratedOutputs, InMemoryStorage) {
    let context = PipelineContext::new().expect("embedded templates register");
    let mut storage = InMemoryStorage::new();
    context
        .generate(key, idl, &mut storage, &CodegenRunOptions::new())
        .unwrap_or_else(|e| panic!("generator {} failed: {}", key, e));
    tracing::debug!(generator = key, outputs = storage.files().len(), "generated");
    (storage.files().clone(), storage)
}
