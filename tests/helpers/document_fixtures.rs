//! Common project fixtures for tests.

#![allow(dead_code)]

use msbuild::document::Document;

pub const PROPERTY_READS: &str = r#"<Project><PropertyGroup><Foo>$(Foo)</Foo><Bar Condition="'$(Foo)'=='x'" /></PropertyGroup></Project>"#;

pub const MIXED_CASE_PROPERTIES: &str = r#"<Project>
  <PropertyGroup>
    <FOO>1</FOO>
    <A>$(Foo);$(fOO)</A>
  </PropertyGroup>
</Project>"#;

pub const ITEMS_AND_TARGETS: &str = r#"<Project DefaultTargets="Build">
  <ItemGroup>
    <Compile Include="a.cs;b.cs">
      <Link>x</Link>
    </Compile>
    <EmbeddedResource Include="@(Compile)" RemoveMetadata="Link" />
  </ItemGroup>
  <Target Name="Build" DependsOnTargets="Prepare;Compile">
    <Message Text="@(Compile->'%(Filename)')" Condition="'%(Compile.Link)' != ''" />
  </Target>
  <Target Name="Prepare" />
</Project>"#;

pub const TRANSFORM_METADATA: &str = r#"<Project>
  <ItemGroup>
    <Compile Include="a.cs">
      <Link>x</Link>
    </Compile>
  </ItemGroup>
  <Target Name="Build">
    <Message Text="@(Compile->'%(Link)')" />
    <Message Text="@(None->'%(Link)')" />
  </Target>
</Project>"#;

pub fn load(text: &str) -> Document {
    Document::parse_resolved(text).unwrap()
}
